// CSV input/output and header resolution for the GTO scorecard

pub mod cache;
pub mod csv;
pub mod error;
pub mod schema;

pub use cache::DecodeCache;
pub use crate::csv::{decode_csv, encode_csv, read_table, write_table};
pub use error::IoError;
pub use schema::{SchemaResolver, Source};
