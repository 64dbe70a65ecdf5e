use std::fmt;
use std::path::PathBuf;

/// Failure to read, decode, or write a CSV table.
#[derive(Debug)]
pub enum IoError {
    /// File could not be opened, read, or written.
    File { path: PathBuf, source: std::io::Error },
    /// Malformed CSV record.
    Csv { table: String, message: String },
    /// No header row.
    MissingHeader { table: String },
}

impl IoError {
    pub(crate) fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(table: &str, err: csv::Error) -> Self {
        Self::Csv {
            table: table.to_string(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Csv { table, message } => write!(f, "malformed CSV in {table}: {message}"),
            Self::MissingHeader { table } => write!(f, "{table} has no header row"),
        }
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::File { source, .. } => Some(source),
            _ => None,
        }
    }
}
