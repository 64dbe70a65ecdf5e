// Decoded-table cache keyed by a BLAKE3 hash of the input bytes

use std::collections::HashMap;

use gto_recon::Table;

use crate::csv::decode_csv;
use crate::error::IoError;

/// Hex BLAKE3 digest of raw input bytes.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(bytes);
    hasher.finalize().to_hex().to_string()
}

/// Identical input bytes decode once; later requests clone the cached table
/// under the caller's table name.
#[derive(Debug, Default)]
pub struct DecodeCache {
    tables: HashMap<String, Table>,
    hits: usize,
}

impl DecodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, bytes: &[u8], name: &str) -> Result<Table, IoError> {
        let key = content_hash(bytes);
        if let Some(table) = self.tables.get(&key) {
            self.hits += 1;
            log::debug!("decode cache hit for {name} ({})", &key[..12]);
            return Ok(table.clone().renamed(name));
        }
        let table = decode_csv(bytes, name)?;
        self.tables.insert(key, table.clone());
        Ok(table)
    }

    /// Distinct inputs decoded so far.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Requests served without decoding.
    pub fn hits(&self) -> usize {
        self.hits
    }
}
