//! `gto-recon`: player reconciliation and ownership allocation engine.
//!
//! Pure engine crate: receives decoded tables, returns the scorecard and its
//! intermediate stage tables. No CLI or IO dependencies.

pub mod allocate;
pub mod config;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod stats;

pub use allocate::allocate;
pub use config::ScorecardConfig;
pub use engine::{run, run_merged};
pub use error::{ErrorKind, ReconError};
pub use matcher::reconcile;
pub use model::{Allocation, JoinedTable, RunResult, ScorecardRow, Table, Value};
pub use normalize::normalize_name;
