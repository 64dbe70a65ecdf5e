//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                                   |
//! |------|-----------------------------------------------------------|
//! | 0    | Success                                                   |
//! | 2    | Usage error (bad arguments, bad `--date`)                 |
//! | 3    | I/O error (unreadable input, unwritable output)           |
//! | 4    | Schema error (missing field, non-numeric cell)            |
//! | 5    | Degenerate input (constant column, too few survivors)     |
//! | 6    | Config error (TOML parse or validation failure)           |

use gto_recon::ErrorKind;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Input file unreadable or malformed CSV, or an output could not be written.
pub const EXIT_IO: u8 = 3;

/// Required field missing, ragged table, or non-numeric value in a numeric field.
pub const EXIT_SCHEMA: u8 = 4;

/// A stage cannot proceed: empty input, zero-width min-max range, fewer than two survivors.
pub const EXIT_DEGENERATE: u8 = 5;

/// Parameter file failed to parse or validate.
pub const EXIT_CONFIG: u8 = 6;

/// Map an engine error class to its exit code.
pub fn engine_exit_code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::Schema => EXIT_SCHEMA,
        ErrorKind::DegenerateInput => EXIT_DEGENERATE,
        ErrorKind::Config => EXIT_CONFIG,
    }
}
