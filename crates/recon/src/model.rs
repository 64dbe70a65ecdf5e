use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Canonical field names
// ---------------------------------------------------------------------------

pub mod fields {
    pub const NAME: &str = "Name";

    // Source A (salary / projection)
    pub const SALARY: &str = "Salary";
    pub const CEILING: &str = "Ceiling";
    pub const PROJECTED_POINTS: &str = "ProjectedPoints";
    pub const PROJECTED_OWNERSHIP: &str = "ProjectedOwnership";

    // Source B (odds)
    pub const MAKE_CUT_PROB: &str = "MakeCutProb";
    pub const TOP20_PROB: &str = "Top20Prob";
    pub const TOP10_PROB: &str = "Top10Prob";
    pub const TOP5_PROB: &str = "Top5Prob";
    pub const WIN_PROB: &str = "WinProb";

    // Columns added by the allocator
    pub const RAW_BASE_OWNERSHIP: &str = "RawBaseOwnership";
    pub const COMPOSITE_ODDS: &str = "CompositeOdds";
    pub const RAW_ODDS_OWNERSHIP: &str = "RawOddsOwnership";
    pub const PRE_ELIMINATION_OWNERSHIP: &str = "PreEliminationOwnership";
    pub const FINAL_OWNERSHIP: &str = "FinalOwnership";

    pub const SOURCE_A: [&str; 5] = [NAME, SALARY, CEILING, PROJECTED_POINTS, PROJECTED_OWNERSHIP];

    pub const PROBABILITIES: [&str; 5] = [MAKE_CUT_PROB, TOP20_PROB, TOP10_PROB, TOP5_PROB, WIN_PROB];
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// A single decoded cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
    Empty,
}

impl Value {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(_) => false,
        }
    }

    /// Numeric view of the cell. Text is parsed leniently; blanks and
    /// non-finite values (`NaN`, `inf`) yield `None`.
    pub fn as_f64(&self) -> Option<f64> {
        let n = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
            Self::Empty => return None,
        };
        n.is_finite().then_some(n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Empty => Ok(()),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

/// Column-major table: ordered column names mapped to equally long value sequences.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Build from a header row and row-major records. Short records are padded with blanks.
    pub fn from_rows(name: impl Into<String>, headers: &[String], rows: Vec<Vec<Value>>) -> Self {
        let mut columns: Vec<Column> = headers
            .iter()
            .map(|h| Column {
                name: h.clone(),
                values: Vec::with_capacity(rows.len()),
            })
            .collect();

        for mut row in rows {
            row.resize(headers.len(), Value::Empty);
            for (col, value) in columns.iter_mut().zip(row) {
                col.values.push(value);
            }
        }

        Self {
            name: name.into(),
            columns,
        }
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(|c| c.values.len()).unwrap_or(0)
    }

    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Like [`Table::column`] but reports the missing field as a schema error.
    pub fn require(&self, name: &str) -> Result<&[Value], ReconError> {
        self.column(name).ok_or_else(|| ReconError::MissingField {
            table: self.name.clone(),
            field: name.into(),
            available: self.headers(),
        })
    }

    /// Every cell of `name` as a number; blanks and text are schema errors.
    pub fn numbers(&self, name: &str) -> Result<Vec<f64>, ReconError> {
        self.require(name)?
            .iter()
            .enumerate()
            .map(|(i, v)| match v {
                Value::Empty => Err(ReconError::MissingValue {
                    table: self.name.clone(),
                    field: name.into(),
                    row: i + 1,
                }),
                _ => v.as_f64().ok_or_else(|| {
                    if v.is_empty() {
                        ReconError::MissingValue {
                            table: self.name.clone(),
                            field: name.into(),
                            row: i + 1,
                        }
                    } else {
                        ReconError::NonNumeric {
                            table: self.name.clone(),
                            field: name.into(),
                            row: i + 1,
                            value: v.to_string(),
                        }
                    }
                }),
            })
            .collect()
    }

    /// Append a column. Its length must match the existing row count.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<Value>) -> Result<(), ReconError> {
        let name = name.into();
        if !self.columns.is_empty() && values.len() != self.row_count() {
            return Err(ReconError::RaggedTable {
                table: self.name.clone(),
                column: name,
                expected: self.row_count(),
                found: values.len(),
            });
        }
        self.columns.push(Column { name, values });
        Ok(())
    }

    /// Check every column has the same length.
    pub fn validate(&self) -> Result<(), ReconError> {
        let expected = self.row_count();
        for col in &self.columns {
            if col.values.len() != expected {
                return Err(ReconError::RaggedTable {
                    table: self.name.clone(),
                    column: col.name.clone(),
                    expected,
                    found: col.values.len(),
                });
            }
        }
        Ok(())
    }

    /// Cells of row `index`, in column order.
    pub fn row(&self, index: usize) -> Vec<&Value> {
        self.columns.iter().map(|c| &c.values[index]).collect()
    }

    /// New table holding only the named columns, in the given order.
    pub fn select(&self, name: impl Into<String>, columns: &[&str]) -> Result<Table, ReconError> {
        let mut out = Table::new(name);
        for col in columns {
            out.columns.push(Column {
                name: (*col).to_string(),
                values: self.require(col)?.to_vec(),
            });
        }
        Ok(out)
    }

    pub fn renamed(mut self, name: impl Into<String>) -> Table {
        self.name = name.into();
        self
    }
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// Best source-B candidate found for one source-A row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchCandidate {
    pub a_index: usize,
    pub a_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b_name: Option<String>,
    pub score: f64,
    pub accepted: bool,
}

/// Reconciler output: the joined rows plus what was left behind.
#[derive(Debug, Clone)]
pub struct JoinedTable {
    pub table: Table,
    /// One entry per source-A row, in source-A order.
    pub candidates: Vec<MatchCandidate>,
    /// Raw names of source-A rows with no acceptable match.
    pub excluded: Vec<String>,
    /// Pre-allocation source-A projected ownership keyed by raw name (first occurrence wins).
    pub projected_ownership: HashMap<String, Value>,
}

impl JoinedTable {
    /// Wrap a table that already carries both sources' fields (merged upload).
    pub fn from_merged(table: Table) -> Result<Self, ReconError> {
        table.validate()?;
        let names = table.require(fields::NAME)?;
        let projected_ownership = ownership_lookup(names, table.column(fields::PROJECTED_OWNERSHIP));
        Ok(Self {
            table,
            candidates: Vec::new(),
            excluded: Vec::new(),
            projected_ownership,
        })
    }

    pub fn matched_count(&self) -> usize {
        self.table.row_count()
    }

    pub fn excluded_count(&self) -> usize {
        self.excluded.len()
    }
}

pub(crate) fn ownership_lookup(names: &[Value], ownership: Option<&[Value]>) -> HashMap<String, Value> {
    let mut lookup = HashMap::new();
    if let Some(ownership) = ownership {
        for (name, own) in names.iter().zip(ownership) {
            lookup.entry(name.to_string()).or_insert_with(|| own.clone());
        }
    }
    lookup
}

// ---------------------------------------------------------------------------
// Allocation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    SalaryOwnership,
    OddsOwnership,
    Elimination,
}

impl Stage {
    pub fn number(&self) -> u8 {
        match self {
            Self::SalaryOwnership => 1,
            Self::OddsOwnership => 2,
            Self::Elimination => 4,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::SalaryOwnership => "salary ownership",
            Self::OddsOwnership => "odds ownership",
            Self::Elimination => "elimination & rescale",
        };
        write!(f, "stage {} ({label})", self.number())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EliminationReport {
    pub percentile: f64,
    pub threshold: f64,
    pub survivors: usize,
    pub eliminated: usize,
    pub scale_factor: f64,
}

/// Final output row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScorecardRow {
    pub name: String,
    pub salary: f64,
    pub ceiling: f64,
    pub projected_points: f64,
    pub composite_odds: f64,
    pub projected_ownership: Option<f64>,
    pub final_ownership: f64,
}

pub const SCORECARD_COLUMNS: [&str; 7] = [
    fields::NAME,
    fields::SALARY,
    fields::CEILING,
    fields::PROJECTED_POINTS,
    fields::COMPOSITE_ODDS,
    fields::PROJECTED_OWNERSHIP,
    fields::FINAL_OWNERSHIP,
];

/// Render scorecard rows as a table in canonical column order.
pub fn scorecard_table(rows: &[ScorecardRow]) -> Table {
    let data = rows
        .iter()
        .map(|r| {
            vec![
                Value::Text(r.name.clone()),
                Value::Number(r.salary),
                Value::Number(r.ceiling),
                Value::Number(r.projected_points),
                Value::Number(r.composite_odds),
                r.projected_ownership.map(Value::Number).unwrap_or(Value::Empty),
                Value::Number(r.final_ownership),
            ]
        })
        .collect();
    let headers: Vec<String> = SCORECARD_COLUMNS.iter().map(|c| c.to_string()).collect();
    Table::from_rows("scorecard", &headers, data)
}

/// Which audit artifact a table is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    SalaryOwnership,
    OddsOwnership,
    PreElimination,
    FinalOwnership,
    Scorecard,
}

#[derive(Debug, Clone)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub table: Table,
}

/// Allocator output. Each stage table is the full table after that stage.
#[derive(Debug, Clone)]
pub struct Allocation {
    pub salary_ownership: Table,
    pub odds_ownership: Table,
    pub pre_elimination: Table,
    pub final_ownership: Table,
    pub elimination: EliminationReport,
    pub scorecard: Vec<ScorecardRow>,
}

impl Allocation {
    /// The four intermediate audit tables plus the scorecard, each self-contained.
    pub fn artifacts(&self) -> Result<Vec<Artifact>, ReconError> {
        use fields::*;
        Ok(vec![
            Artifact {
                kind: ArtifactKind::SalaryOwnership,
                table: self.salary_ownership.select("salary_ownership", &[NAME, RAW_BASE_OWNERSHIP])?,
            },
            Artifact {
                kind: ArtifactKind::OddsOwnership,
                table: self
                    .odds_ownership
                    .select("odds_ownership", &[NAME, COMPOSITE_ODDS, RAW_ODDS_OWNERSHIP])?,
            },
            Artifact {
                kind: ArtifactKind::PreElimination,
                table: self
                    .pre_elimination
                    .select("pre_elimination", &[NAME, PRE_ELIMINATION_OWNERSHIP])?,
            },
            Artifact {
                kind: ArtifactKind::FinalOwnership,
                table: self.final_ownership.select("final_ownership", &[NAME, FINAL_OWNERSHIP])?,
            },
            Artifact {
                kind: ArtifactKind::Scorecard,
                table: scorecard_table(&self.scorecard),
            },
        ])
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub source_a_rows: usize,
    pub source_b_rows: usize,
    pub matched: usize,
    pub excluded: usize,
    pub survivors: usize,
    pub eliminated: usize,
    pub elimination_threshold: f64,
    pub ownership_total: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub meta: RunMeta,
    pub summary: RunSummary,
    pub scorecard: Vec<ScorecardRow>,
    pub excluded: Vec<String>,
    pub matches: Vec<MatchCandidate>,
    #[serde(skip)]
    pub allocation: Allocation,
}
