// CSV decode/encode for player tables

use std::path::Path;

use gto_recon::{Table, Value};

use crate::error::IoError;

/// Read a CSV file into a table named `name`.
pub fn read_table(path: &Path, name: &str) -> Result<Table, IoError> {
    let bytes = std::fs::read(path).map_err(|e| IoError::file(path, e))?;
    decode_csv(&bytes, name)
}

/// Write `table` as comma-separated UTF-8.
pub fn write_table(table: &Table, path: &Path) -> Result<(), IoError> {
    let bytes = encode_csv(table)?;
    std::fs::write(path, bytes).map_err(|e| IoError::file(path, e))
}

/// Decode raw CSV bytes. The first record is the header row.
pub fn decode_csv(bytes: &[u8], name: &str) -> Result<Table, IoError> {
    let content = decode_text(bytes);
    let delimiter = sniff_delimiter(&content);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();
    let headers: Vec<String> = match records.next() {
        Some(record) => record
            .map_err(|e| IoError::csv(name, e))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect(),
        None => return Err(IoError::MissingHeader { table: name.to_string() }),
    };
    if headers.iter().all(|h| h.is_empty()) {
        return Err(IoError::MissingHeader { table: name.to_string() });
    }

    let mut rows = Vec::new();
    for result in records {
        let record = result.map_err(|e| IoError::csv(name, e))?;
        // Blank trailing lines
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        rows.push(record.iter().map(parse_cell).collect());
    }

    log::debug!(
        "decoded {name}: {} columns, {} rows (delimiter {:?})",
        headers.len(),
        rows.len(),
        delimiter as char
    );
    Ok(Table::from_rows(name, &headers, rows))
}

/// Encode a table with a header row; numbers use shortest round-trip formatting.
pub fn encode_csv(table: &Table) -> Result<Vec<u8>, IoError> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer
        .write_record(table.headers())
        .map_err(|e| IoError::csv(&table.name, e))?;
    for i in 0..table.row_count() {
        let record: Vec<String> = table.row(i).into_iter().map(|v| v.to_string()).collect();
        writer
            .write_record(&record)
            .map_err(|e| IoError::csv(&table.name, e))?;
    }
    writer
        .into_inner()
        .map_err(|e| IoError::Csv {
            table: table.name.clone(),
            message: e.to_string(),
        })
}

/// Classify one raw cell.
///
/// Accepts a leading `$`, `,` thousands separators and a trailing `%`
/// (the percent sign is dropped, the magnitude kept as written).
pub fn parse_cell(raw: &str) -> Value {
    let s = raw.trim();
    if s.is_empty() {
        return Value::Empty;
    }
    match parse_number(s) {
        Some(n) => Value::Number(n),
        None => Value::Text(s.to_string()),
    }
}

fn parse_number(s: &str) -> Option<f64> {
    let (negative, s) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let s = s.strip_prefix('$').unwrap_or(s);
    let s = s.strip_suffix('%').unwrap_or(s).trim_end();
    if s.is_empty() || !s.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return None;
    }
    let cleaned: String = s.chars().filter(|c| *c != ',').collect();
    let n: f64 = cleaned.parse().ok()?;
    if !n.is_finite() {
        return None;
    }
    Some(if negative { -n } else { n })
}

/// UTF-8 first; Windows-1252 fallback for spreadsheet exports.
fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

/// Pick the delimiter whose field count is most consistent over the first lines.
///
/// Candidates are tab, semicolon, comma and pipe. A candidate must split the
/// first line into more than one field; wider consistent splits win ties.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).take(10).collect();

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        let first = counts.first().copied().unwrap_or(0);
        if first <= 1 {
            continue;
        }
        let consistent = counts.iter().filter(|&&c| c == first).count() as u64;
        let score = consistent * first as u64;
        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}
