use std::collections::HashMap;

use serde::Deserialize;

use crate::error::ReconError;
use crate::stats::Range;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Run parameters. Every field has a default, so an empty TOML document is valid.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScorecardConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub reconcile: ReconcileParams,
    #[serde(default)]
    pub allocate: AllocateParams,
    #[serde(default)]
    pub aliases: AliasConfig,
}

// ---------------------------------------------------------------------------
// Reconcile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconcileParams {
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
}

fn default_similarity_threshold() -> f64 {
    0.8
}

impl Default for ReconcileParams {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

// ---------------------------------------------------------------------------
// Allocate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AllocateParams {
    /// Quantile of pre-elimination ownership at or below which rows are eliminated.
    #[serde(default = "default_elimination_percentile")]
    pub elimination_percentile: f64,
    /// Output interval of the salary and odds min-max maps.
    #[serde(default = "default_base_range")]
    pub base_range: Range,
    /// Output interval of the survivor remap, before the fixed-sum rescale.
    #[serde(default = "default_final_range")]
    pub final_range: Range,
    /// Sum of final ownership across survivors.
    #[serde(default = "default_target_total")]
    pub target_total: f64,
}

fn default_elimination_percentile() -> f64 {
    0.2
}

fn default_base_range() -> Range {
    Range::new(0.5, 20.0)
}

fn default_final_range() -> Range {
    Range::new(0.7, 22.2)
}

fn default_target_total() -> f64 {
    600.0
}

impl Default for AllocateParams {
    fn default() -> Self {
        Self {
            elimination_percentile: default_elimination_percentile(),
            base_range: default_base_range(),
            final_range: default_final_range(),
            target_total: default_target_total(),
        }
    }
}

// ---------------------------------------------------------------------------
// Header aliases (consumed by the schema resolver in the IO layer)
// ---------------------------------------------------------------------------

/// Extra source headers per canonical field, e.g. `ProjectedOwnership = ["Proj Own%"]`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AliasConfig {
    #[serde(default)]
    pub source_a: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub source_b: HashMap<String, Vec<String>>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ScorecardConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ScorecardConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        self.reconcile.validate()?;
        self.allocate.validate()
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("default")
    }
}

impl ReconcileParams {
    pub fn validate(&self) -> Result<(), ReconError> {
        let t = self.similarity_threshold;
        if !(t > 0.0 && t <= 1.0) {
            return Err(ReconError::ConfigValidation(format!(
                "similarity_threshold must be in (0, 1], got {t}"
            )));
        }
        Ok(())
    }
}

impl AllocateParams {
    pub fn validate(&self) -> Result<(), ReconError> {
        let p = self.elimination_percentile;
        if !(0.0..1.0).contains(&p) {
            return Err(ReconError::ConfigValidation(format!(
                "elimination_percentile must be in [0, 1), got {p}"
            )));
        }

        for (label, range) in [("base_range", self.base_range), ("final_range", self.final_range)] {
            if !(range.lo.is_finite() && range.hi.is_finite()) || range.lo < 0.0 || range.lo >= range.hi {
                return Err(ReconError::ConfigValidation(format!(
                    "{label} must satisfy 0 <= lo < hi, got [{}, {}]",
                    range.lo, range.hi
                )));
            }
        }

        if !(self.target_total.is_finite() && self.target_total > 0.0) {
            return Err(ReconError::ConfigValidation(format!(
                "target_total must be positive, got {}",
                self.target_total
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = ScorecardConfig::from_toml("").unwrap();
        assert_eq!(config.reconcile.similarity_threshold, 0.8);
        assert_eq!(config.allocate.elimination_percentile, 0.2);
        assert_eq!(config.allocate.base_range, Range::new(0.5, 20.0));
        assert_eq!(config.allocate.final_range, Range::new(0.7, 22.2));
        assert_eq!(config.allocate.target_total, 600.0);
        assert_eq!(config.display_name(), "default");
    }

    #[test]
    fn full_document() {
        let config = ScorecardConfig::from_toml(
            r#"
name = "Masters week"

[reconcile]
similarity_threshold = 0.9

[allocate]
elimination_percentile = 0.25
base_range = [1.0, 25.0]
final_range = [0.5, 30.0]
target_total = 800.0

[aliases.source_a]
ProjectedOwnership = ["Proj Own%", "pOwn"]

[aliases.source_b]
WinProb = ["win_pct"]
"#,
        )
        .unwrap();
        assert_eq!(config.display_name(), "Masters week");
        assert_eq!(config.reconcile.similarity_threshold, 0.9);
        assert_eq!(config.allocate.base_range, Range::new(1.0, 25.0));
        assert_eq!(config.allocate.target_total, 800.0);
        assert_eq!(config.aliases.source_a["ProjectedOwnership"], vec!["Proj Own%", "pOwn"]);
        assert_eq!(config.aliases.source_b["WinProb"], vec!["win_pct"]);
    }

    #[test]
    fn rejects_zero_threshold() {
        let err = ScorecardConfig::from_toml("[reconcile]\nsimilarity_threshold = 0.0").unwrap_err();
        assert!(matches!(err, ReconError::ConfigValidation(_)));
    }

    #[test]
    fn rejects_inverted_range() {
        let err = ScorecardConfig::from_toml("[allocate]\nfinal_range = [22.2, 0.7]").unwrap_err();
        assert!(err.to_string().contains("final_range"));
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = ScorecardConfig::from_toml("[allocate]\ntarget = 600.0").unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn rejects_full_percentile() {
        let err = ScorecardConfig::from_toml("[allocate]\nelimination_percentile = 1.0").unwrap_err();
        assert!(matches!(err, ReconError::ConfigValidation(_)));
    }
}
