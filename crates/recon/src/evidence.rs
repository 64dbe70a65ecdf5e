use crate::model::{Allocation, JoinedTable, RunSummary};

/// Compute summary counts for one run.
pub fn compute_summary(
    joined: &JoinedTable,
    allocation: &Allocation,
    source_a_rows: usize,
    source_b_rows: usize,
) -> RunSummary {
    RunSummary {
        source_a_rows,
        source_b_rows,
        matched: joined.matched_count(),
        excluded: joined.excluded_count(),
        survivors: allocation.elimination.survivors,
        eliminated: allocation.elimination.eliminated,
        elimination_threshold: allocation.elimination.threshold,
        ownership_total: allocation.scorecard.iter().map(|r| r.final_ownership).sum(),
    }
}
