use crate::allocate::allocate;
use crate::config::ScorecardConfig;
use crate::error::ReconError;
use crate::evidence::compute_summary;
use crate::matcher::reconcile;
use crate::model::{JoinedTable, RunMeta, RunResult, Table};

/// Reconcile the two sources, then allocate ownership over the joined rows.
pub fn run(config: &ScorecardConfig, source_a: &Table, source_b: &Table) -> Result<RunResult, ReconError> {
    config.validate()?;
    let joined = reconcile(source_a, source_b, config.reconcile.similarity_threshold)?;
    finish(config, joined, source_a.row_count(), source_b.row_count())
}

/// Allocate over a table that already carries both sources' columns.
pub fn run_merged(config: &ScorecardConfig, merged: Table) -> Result<RunResult, ReconError> {
    config.validate()?;
    let rows = merged.row_count();
    let joined = JoinedTable::from_merged(merged)?;
    finish(config, joined, rows, rows)
}

fn finish(
    config: &ScorecardConfig,
    joined: JoinedTable,
    source_a_rows: usize,
    source_b_rows: usize,
) -> Result<RunResult, ReconError> {
    let allocation = allocate(&joined, &config.allocate)?;
    let summary = compute_summary(&joined, &allocation, source_a_rows, source_b_rows);

    log::info!(
        "scorecard: {} of {} matched rows survive elimination (threshold {:.4})",
        summary.survivors,
        summary.matched,
        summary.elimination_threshold
    );

    Ok(RunResult {
        meta: RunMeta {
            config_name: config.display_name().to_string(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        scorecard: allocation.scorecard.clone(),
        excluded: joined.excluded,
        matches: joined.candidates,
        allocation,
    })
}
