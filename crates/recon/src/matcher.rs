use std::collections::HashMap;

use crate::error::ReconError;
use crate::model::{fields, ownership_lookup, JoinedTable, MatchCandidate, Table, Value};
use crate::normalize::{normalize_name, similarity};

/// Match every source-A row to its closest source-B row by normalized name.
///
/// Exact normalized matches resolve through a hash lookup; everything else scans
/// source B in order and keeps the first candidate with the highest score. A match
/// is accepted when its score is at least `similarity_threshold`. Accepted pairs are
/// joined field-wise, source A winning on column-name collisions.
pub fn reconcile(
    source_a: &Table,
    source_b: &Table,
    similarity_threshold: f64,
) -> Result<JoinedTable, ReconError> {
    source_a.validate()?;
    source_b.validate()?;
    let a_names = source_a.require(fields::NAME)?;
    let b_names = source_b.require(fields::NAME)?;

    let a_keys: Vec<String> = a_names.iter().map(|v| normalize_name(&v.to_string())).collect();
    let b_keys: Vec<String> = b_names.iter().map(|v| normalize_name(&v.to_string())).collect();

    // First B row per normalized name
    let mut exact: HashMap<&str, usize> = HashMap::new();
    for (i, key) in b_keys.iter().enumerate() {
        exact.entry(key.as_str()).or_insert(i);
    }

    let mut candidates = Vec::with_capacity(a_keys.len());
    for (ai, a_key) in a_keys.iter().enumerate() {
        let best = match exact.get(a_key.as_str()) {
            Some(&bi) => Some((bi, 1.0)),
            None => best_candidate(a_key, &b_keys),
        };

        let a_name = a_names[ai].to_string();
        let candidate = match best {
            Some((bi, score)) => MatchCandidate {
                a_index: ai,
                a_name,
                b_index: Some(bi),
                b_name: Some(b_names[bi].to_string()),
                score,
                accepted: score >= similarity_threshold,
            },
            None => MatchCandidate {
                a_index: ai,
                a_name,
                b_index: None,
                b_name: None,
                score: 0.0,
                accepted: false,
            },
        };

        if candidate.accepted && candidate.score < 1.0 {
            log::debug!(
                "fuzzy match '{}' -> '{}' (score {:.3})",
                candidate.a_name,
                candidate.b_name.as_deref().unwrap_or_default(),
                candidate.score
            );
        }
        candidates.push(candidate);
    }

    let excluded: Vec<String> = candidates
        .iter()
        .filter(|c| !c.accepted)
        .map(|c| c.a_name.clone())
        .collect();
    if !excluded.is_empty() {
        log::info!(
            "{} of {} source-A rows had no match at threshold {similarity_threshold}",
            excluded.len(),
            candidates.len()
        );
    }

    let table = join(source_a, source_b, &candidates)?;
    let projected_ownership = ownership_lookup(a_names, source_a.column(fields::PROJECTED_OWNERSHIP));

    Ok(JoinedTable {
        table,
        candidates,
        excluded,
        projected_ownership,
    })
}

/// Highest-scoring B index for `key`; ties keep the earliest row.
fn best_candidate(key: &str, b_keys: &[String]) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (bi, b_key) in b_keys.iter().enumerate() {
        let score = similarity(key, b_key);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((bi, score));
        }
    }
    best
}

/// Join accepted pairs. Column order: all of A, then B columns A does not have.
fn join(source_a: &Table, source_b: &Table, candidates: &[MatchCandidate]) -> Result<Table, ReconError> {
    let accepted: Vec<(usize, usize)> = candidates
        .iter()
        .filter(|c| c.accepted)
        .filter_map(|c| c.b_index.map(|bi| (c.a_index, bi)))
        .collect();

    let mut joined = Table::new("joined");
    for col in &source_a.columns {
        let values: Vec<Value> = accepted.iter().map(|&(ai, _)| col.values[ai].clone()).collect();
        joined.push_column(col.name.clone(), values)?;
    }
    for col in &source_b.columns {
        if source_a.has_column(&col.name) {
            continue;
        }
        let values: Vec<Value> = accepted.iter().map(|&(_, bi)| col.values[bi].clone()).collect();
        joined.push_column(col.name.clone(), values)?;
    }
    Ok(joined)
}
