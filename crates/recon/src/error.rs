use std::fmt;

use crate::model::Stage;

/// Coarse classification used by callers to pick exit codes and messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Schema,
    DegenerateInput,
    Config,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReconError {
    /// A required canonical field is absent after schema resolution.
    MissingField {
        table: String,
        field: String,
        available: Vec<String>,
    },
    /// Columns of one table disagree on row count.
    RaggedTable {
        table: String,
        column: String,
        expected: usize,
        found: usize,
    },
    /// A required numeric cell holds text.
    NonNumeric {
        table: String,
        field: String,
        row: usize,
        value: String,
    },
    /// A required numeric cell is blank.
    MissingValue { table: String, field: String, row: usize },
    /// A min-max map or fixed-sum rescale would divide by zero.
    Degenerate {
        stage: Stage,
        column: String,
        reason: String,
    },
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Parameter out of range.
    ConfigValidation(String),
}

impl ReconError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingField { .. }
            | Self::RaggedTable { .. }
            | Self::NonNumeric { .. }
            | Self::MissingValue { .. } => ErrorKind::Schema,
            Self::Degenerate { .. } => ErrorKind::DegenerateInput,
            Self::ConfigParse(_) | Self::ConfigValidation(_) => ErrorKind::Config,
        }
    }

    pub(crate) fn degenerate(stage: Stage, column: &str, reason: impl Into<String>) -> Self {
        Self::Degenerate {
            stage,
            column: column.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { table, field, available } => {
                write!(
                    f,
                    "schema error: table '{table}' has no '{field}' column (available: {})",
                    available.join(", ")
                )
            }
            Self::RaggedTable { table, column, expected, found } => {
                write!(
                    f,
                    "schema error: table '{table}', column '{column}' has {found} values, expected {expected}"
                )
            }
            Self::NonNumeric { table, field, row, value } => {
                write!(
                    f,
                    "schema error: table '{table}', row {row}: '{field}' is not a number ('{value}')"
                )
            }
            Self::MissingValue { table, field, row } => {
                write!(f, "schema error: table '{table}', row {row}: '{field}' is blank")
            }
            Self::Degenerate { stage, column, reason } => {
                write!(f, "degenerate input at {stage} ('{column}'): {reason}")
            }
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
