//! Header resolution: map provider-specific column names onto canonical fields.
//!
//! Provider exports disagree on naming (`Golfer` vs `Player`, `DG_Win%` vs
//! `win`). The resolver renames the first header matching each canonical field
//! and leaves every other column alone. It never fails; a field that stays
//! missing is reported by the engine when it is required.

use std::collections::{HashMap, HashSet};

use gto_recon::config::AliasConfig;
use gto_recon::model::fields;
use gto_recon::Table;

/// Which provider a table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Salary / projection file
    A,
    /// Odds file
    B,
    /// Single file carrying both sources' columns
    Merged,
}

const NAME_ALIASES: &[&str] = &["Golfer", "Player", "player_name", "Player Name"];

const SOURCE_A_ALIASES: &[(&str, &[&str])] = &[
    (fields::NAME, NAME_ALIASES),
    (fields::SALARY, &["DK Salary", "dk_salary", "Sal"]),
    (fields::CEILING, &["Ceil", "ceiling_pts"]),
    (fields::PROJECTED_POINTS, &["RG_ProjPts", "ProjPts", "Proj Pts", "Projection", "FPTS"]),
    (
        fields::PROJECTED_OWNERSHIP,
        &["RG_Ownership%", "Proj Own%", "Ownership", "pOwn", "proj_own"],
    ),
];

const SOURCE_B_ALIASES: &[(&str, &[&str])] = &[
    (fields::NAME, NAME_ALIASES),
    (fields::MAKE_CUT_PROB, &["DG_MakeCut%", "make_cut", "MakeCut"]),
    (fields::TOP20_PROB, &["DG_Top20%", "top_20", "Top20"]),
    (fields::TOP10_PROB, &["DG_Top10%", "top_10", "Top10"]),
    (fields::TOP5_PROB, &["DG_Top5%", "top_5", "Top5"]),
    (fields::WIN_PROB, &["DG_Win%", "win", "win_prob"]),
];

/// Comparison key: lowercase with spaces, `_`, `-` and `%` removed.
fn header_key(header: &str) -> String {
    header
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-' | '%'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Canonical field → accepted header keys, in declaration order.
#[derive(Debug, Clone)]
pub struct SchemaResolver {
    source_a: Vec<(String, Vec<String>)>,
    source_b: Vec<(String, Vec<String>)>,
}

impl Default for SchemaResolver {
    fn default() -> Self {
        Self {
            source_a: builtin(SOURCE_A_ALIASES),
            source_b: builtin(SOURCE_B_ALIASES),
        }
    }
}

fn builtin(table: &[(&str, &[&str])]) -> Vec<(String, Vec<String>)> {
    table
        .iter()
        .map(|(field, aliases)| {
            let mut keys = vec![header_key(field)];
            keys.extend(aliases.iter().map(|a| header_key(a)));
            (field.to_string(), keys)
        })
        .collect()
}

fn extend(entries: &mut Vec<(String, Vec<String>)>, extra: &HashMap<String, Vec<String>>) {
    // Sorted for a stable order when config adds new canonical fields
    let mut extra: Vec<_> = extra.iter().collect();
    extra.sort_by(|a, b| a.0.cmp(b.0));
    for (field, aliases) in extra {
        let keys = aliases.iter().map(|a| header_key(a));
        match entries.iter_mut().find(|(f, _)| f == field) {
            Some((_, existing)) => existing.extend(keys),
            None => {
                let mut all = vec![header_key(field)];
                all.extend(keys);
                entries.push((field.clone(), all));
            }
        }
    }
}

impl SchemaResolver {
    /// Built-in aliases extended with the config's `[aliases.*]` tables.
    pub fn with_aliases(aliases: &AliasConfig) -> Self {
        let mut resolver = Self::default();
        extend(&mut resolver.source_a, &aliases.source_a);
        extend(&mut resolver.source_b, &aliases.source_b);
        resolver
    }

    /// Rename headers of `table` to canonical field names.
    pub fn resolve(&self, mut table: Table, source: Source) -> Table {
        let entries: Vec<&(String, Vec<String>)> = match source {
            Source::A => self.source_a.iter().collect(),
            Source::B => self.source_b.iter().collect(),
            Source::Merged => self.source_a.iter().chain(self.source_b.iter()).collect(),
        };

        let mut claimed: HashSet<usize> = HashSet::new();
        let mut done: HashSet<&str> = HashSet::new();
        for (field, keys) in entries {
            if !done.insert(field.as_str()) {
                continue;
            }
            // An exact canonical header always wins over an alias
            let exact = table.columns.iter().position(|c| &c.name == field);
            let hit = exact.or_else(|| {
                (0..table.columns.len()).find(|i| {
                    !claimed.contains(i) && keys.contains(&header_key(&table.columns[*i].name))
                })
            });
            if let Some(i) = hit {
                claimed.insert(i);
                let column = &mut table.columns[i];
                if &column.name != field {
                    log::debug!("{}: header '{}' -> {field}", table.name, column.name);
                    column.name = field.clone();
                }
            }
        }
        table
    }
}
