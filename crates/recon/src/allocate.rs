//! Ownership allocation: five pure stages over the joined table.
//!
//! Each stage takes the previous stage's table by reference and returns a new
//! table with its own columns appended; no stage rewrites an earlier column.

use crate::config::AllocateParams;
use crate::error::ReconError;
use crate::model::{fields, Allocation, EliminationReport, JoinedTable, ScorecardRow, Stage, Table, Value};
use crate::stats::{mean_present, min_max, min_max_map, percentile_linear};

/// Run stages 1 through 5. Any degenerate stage aborts the whole allocation.
pub fn allocate(joined: &JoinedTable, params: &AllocateParams) -> Result<Allocation, ReconError> {
    params.validate()?;
    check_schema(&joined.table)?;

    let salary_ownership = salary_ownership(&joined.table, params)?;
    let odds_ownership = odds_ownership(&salary_ownership, params)?;
    let pre_elimination = pre_elimination(&odds_ownership)?;
    let (final_ownership, elimination) = eliminate_and_rescale(&pre_elimination, params)?;
    let scorecard = assemble_scorecard(&final_ownership, joined)?;

    Ok(Allocation {
        salary_ownership,
        odds_ownership,
        pre_elimination,
        final_ownership,
        elimination,
        scorecard,
    })
}

/// Every canonical field the allocator reads, checked before any stage runs.
pub fn check_schema(table: &Table) -> Result<(), ReconError> {
    table.validate()?;
    for field in fields::SOURCE_A.iter().chain(fields::PROBABILITIES.iter()) {
        table.require(field)?;
    }
    Ok(())
}

/// Stage 1: map salary linearly onto the base range.
pub fn salary_ownership(table: &Table, params: &AllocateParams) -> Result<Table, ReconError> {
    let salaries = table.numbers(fields::SALARY)?;
    let mapped = min_max_map(&salaries, params.base_range).ok_or_else(|| {
        ReconError::degenerate(Stage::SalaryOwnership, fields::SALARY, constant_reason(&salaries))
    })?;

    let mut out = table.clone().renamed("salary_ownership");
    out.push_column(fields::RAW_BASE_OWNERSHIP, numbers(mapped))?;
    Ok(out)
}

/// Stage 2: mean of the five outcome probabilities, mapped onto the base range.
pub fn odds_ownership(table: &Table, params: &AllocateParams) -> Result<Table, ReconError> {
    let mut probability_columns = Vec::with_capacity(fields::PROBABILITIES.len());
    for field in fields::PROBABILITIES {
        probability_columns.push((field, table.require(field)?));
    }

    let mut composite = Vec::with_capacity(table.row_count());
    for row in 0..table.row_count() {
        let mut present = Vec::with_capacity(probability_columns.len());
        for (field, values) in &probability_columns {
            let cell = &values[row];
            if cell.is_empty() {
                present.push(None);
                continue;
            }
            let n = cell.as_f64().ok_or_else(|| ReconError::NonNumeric {
                table: table.name.clone(),
                field: (*field).to_string(),
                row: row + 1,
                value: cell.to_string(),
            })?;
            present.push(Some(n));
        }
        let mean = mean_present(present).ok_or_else(|| ReconError::MissingValue {
            table: table.name.clone(),
            field: fields::PROBABILITIES.join("/"),
            row: row + 1,
        })?;
        composite.push(mean);
    }

    let mapped = min_max_map(&composite, params.base_range).ok_or_else(|| {
        ReconError::degenerate(Stage::OddsOwnership, fields::COMPOSITE_ODDS, constant_reason(&composite))
    })?;

    let mut out = table.clone().renamed("odds_ownership");
    out.push_column(fields::COMPOSITE_ODDS, numbers(composite))?;
    out.push_column(fields::RAW_ODDS_OWNERSHIP, numbers(mapped))?;
    Ok(out)
}

/// Stage 3: unweighted average of the salary and odds signals.
pub fn pre_elimination(table: &Table) -> Result<Table, ReconError> {
    let base = table.numbers(fields::RAW_BASE_OWNERSHIP)?;
    let odds = table.numbers(fields::RAW_ODDS_OWNERSHIP)?;
    let blended: Vec<f64> = base.iter().zip(&odds).map(|(b, o)| 0.5 * (b + o)).collect();

    let mut out = table.clone().renamed("pre_elimination");
    out.push_column(fields::PRE_ELIMINATION_OWNERSHIP, numbers(blended))?;
    Ok(out)
}

/// Stage 4: drop rows at or below the elimination percentile, remap survivors onto
/// the final range, then scale them to sum to the target total.
///
/// Eliminated rows stay in the table with a final ownership of exactly zero.
pub fn eliminate_and_rescale(
    table: &Table,
    params: &AllocateParams,
) -> Result<(Table, EliminationReport), ReconError> {
    let column = fields::PRE_ELIMINATION_OWNERSHIP;
    let pre = table.numbers(column)?;

    let threshold = percentile_linear(&pre, params.elimination_percentile)
        .ok_or_else(|| ReconError::degenerate(Stage::Elimination, column, "no rows to rank"))?;

    let survives: Vec<bool> = pre.iter().map(|v| *v > threshold).collect();
    let survivor_values: Vec<f64> = pre
        .iter()
        .zip(&survives)
        .filter(|(_, s)| **s)
        .map(|(v, _)| *v)
        .collect();

    log::debug!(
        "elimination threshold {threshold:.4} (p{}), {} of {} rows survive",
        params.elimination_percentile * 100.0,
        survivor_values.len(),
        pre.len()
    );

    if survivor_values.len() < 2 {
        return Err(ReconError::degenerate(
            Stage::Elimination,
            column,
            format!(
                "{} row(s) above threshold {threshold}; at least 2 are needed to rescale",
                survivor_values.len()
            ),
        ));
    }

    let mapped = min_max_map(&survivor_values, params.final_range).ok_or_else(|| {
        ReconError::degenerate(Stage::Elimination, column, constant_reason(&survivor_values))
    })?;

    let total: f64 = mapped.iter().sum();
    if !(total.is_finite() && total > 0.0) {
        return Err(ReconError::degenerate(
            Stage::Elimination,
            column,
            format!("survivor total {total} cannot be rescaled"),
        ));
    }
    let factor = params.target_total / total;

    let mut scaled = mapped.into_iter().map(|v| v * factor);
    let final_values: Vec<f64> = survives
        .iter()
        .map(|s| if *s { scaled.next().unwrap_or(0.0) } else { 0.0 })
        .collect();

    let report = EliminationReport {
        percentile: params.elimination_percentile,
        threshold,
        survivors: survivor_values.len(),
        eliminated: pre.len() - survivor_values.len(),
        scale_factor: factor,
    };

    let mut out = table.clone().renamed("final_ownership");
    out.push_column(fields::FINAL_OWNERSHIP, numbers(final_values))?;
    Ok((out, report))
}

/// Stage 5: keep positive-ownership rows in canonical scorecard form.
///
/// Projected ownership comes from the pre-allocation source-A record, looked up by name.
pub fn assemble_scorecard(table: &Table, joined: &JoinedTable) -> Result<Vec<ScorecardRow>, ReconError> {
    let names = table.require(fields::NAME)?;
    let salary = table.numbers(fields::SALARY)?;
    let ceiling = table.numbers(fields::CEILING)?;
    let points = table.numbers(fields::PROJECTED_POINTS)?;
    let composite = table.numbers(fields::COMPOSITE_ODDS)?;
    let final_ownership = table.numbers(fields::FINAL_OWNERSHIP)?;

    let mut rows = Vec::new();
    for i in 0..table.row_count() {
        if final_ownership[i] <= 0.0 {
            continue;
        }
        let name = names[i].to_string();
        let projected_ownership = match joined.projected_ownership.get(&name) {
            Some(v) if !v.is_empty() => Some(v.as_f64().ok_or_else(|| ReconError::NonNumeric {
                table: "source_a".into(),
                field: fields::PROJECTED_OWNERSHIP.into(),
                row: i + 1,
                value: v.to_string(),
            })?),
            _ => None,
        };

        rows.push(ScorecardRow {
            name,
            salary: salary[i],
            ceiling: ceiling[i],
            projected_points: points[i],
            composite_odds: composite[i],
            projected_ownership,
            final_ownership: final_ownership[i],
        });
    }
    Ok(rows)
}

fn numbers(values: Vec<f64>) -> Vec<Value> {
    values.into_iter().map(Value::Number).collect()
}

/// Why `min_max_map` refused `values`.
fn constant_reason(values: &[f64]) -> String {
    if let Some((i, v)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return format!("row {} is {v}; min-max needs finite values", i + 1);
    }
    match min_max(values) {
        None => "column is empty".into(),
        Some((lo, hi)) if lo == hi => format!("all {} values equal {lo}; min-max range is zero", values.len()),
        Some((lo, hi)) => format!("values span [{lo}, {hi}]; min-max range is not finite"),
    }
}
