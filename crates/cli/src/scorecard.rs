//! `gto run` / `gto score` / `gto match` / `gto validate`.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;

use gto_io::{encode_csv, write_table, DecodeCache, SchemaResolver, Source};
use gto_recon::model::{scorecard_table, ArtifactKind, MatchCandidate, RunResult};
use gto_recon::{reconcile, ScorecardConfig, Table};

use crate::exit_codes::EXIT_CONFIG;
use crate::{CliError, OutputArgs, ParamArgs};

// ============================================================================
// Parameters
// ============================================================================

fn load_config(path: Option<&Path>) -> Result<ScorecardConfig, CliError> {
    let Some(path) = path else {
        return Ok(ScorecardConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("cannot read config {}: {e}", path.display())))?;
    ScorecardConfig::from_toml(&text).map_err(|e| CliError {
        code: EXIT_CONFIG,
        message: format!("{}: {e}", path.display()),
        hint: None,
    })
}

/// Apply command-line overrides on top of the file values.
fn apply_overrides(
    mut config: ScorecardConfig,
    threshold: Option<f64>,
    percentile: Option<f64>,
    target_total: Option<f64>,
) -> Result<ScorecardConfig, CliError> {
    if let Some(t) = threshold {
        config.reconcile.similarity_threshold = t;
    }
    if let Some(p) = percentile {
        config.allocate.elimination_percentile = p;
    }
    if let Some(n) = target_total {
        config.allocate.target_total = n;
    }
    config
        .validate()
        .map_err(|e| CliError::usage(e.to_string()))?;
    Ok(config)
}

fn params_config(params: &ParamArgs, threshold: Option<f64>) -> Result<ScorecardConfig, CliError> {
    let config = load_config(params.config.as_deref())?;
    apply_overrides(config, threshold, params.percentile, params.target_total)
}

/// `--date` must be a real calendar date in MMDDYY form.
fn resolve_date(date: Option<&str>) -> Result<String, CliError> {
    match date {
        None => Ok(chrono::Local::now().format("%m%d%y").to_string()),
        Some(d) => {
            let valid = d.len() == 6
                && d.chars().all(|c| c.is_ascii_digit())
                && NaiveDate::parse_from_str(d, "%m%d%y").is_ok();
            if valid {
                Ok(d.to_string())
            } else {
                Err(CliError::usage(format!("invalid --date \"{d}\"")).with_hint("expected MMDDYY, e.g. 041425"))
            }
        }
    }
}

// ============================================================================
// Inputs
// ============================================================================

fn read_source(
    cache: &mut DecodeCache,
    resolver: &SchemaResolver,
    path: &Path,
    name: &str,
    source: Source,
) -> Result<Table, CliError> {
    let bytes = std::fs::read(path)
        .map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))?;
    let table = cache.decode(&bytes, name)?;
    Ok(resolver.resolve(table, source))
}

fn read_pair(config: &ScorecardConfig, salary: &Path, odds: &Path) -> Result<(Table, Table), CliError> {
    let resolver = SchemaResolver::with_aliases(&config.aliases);
    let mut cache = DecodeCache::new();
    let a = read_source(&mut cache, &resolver, salary, "source_a", Source::A)?;
    let b = read_source(&mut cache, &resolver, odds, "source_b", Source::B)?;
    if cache.hits() > 0 {
        log::warn!("salary and odds inputs are byte-identical; decoded once");
    }
    log::debug!("decoded {} distinct input(s), {} cache hit(s)", cache.len(), cache.hits());
    Ok((a, b))
}

// ============================================================================
// Outputs
// ============================================================================

/// File name for one stage artifact, e.g. `GTO_FinalOwn_041425.csv`.
pub fn artifact_file_name(kind: ArtifactKind, date: &str) -> String {
    let stem = match kind {
        ArtifactKind::SalaryOwnership => "GTO_SalaryOwn",
        ArtifactKind::OddsOwnership => "GTO_DGOwn",
        ArtifactKind::PreElimination => "GTO_PreElim",
        ArtifactKind::FinalOwnership => "GTO_FinalOwn",
        ArtifactKind::Scorecard => "gto_scorecard",
    };
    format!("{stem}_{date}.csv")
}

fn write_artifacts(result: &RunResult, dir: &Path, date: &str, quiet: bool) -> Result<(), CliError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| CliError::io(format!("cannot create {}: {e}", dir.display())))?;
    for artifact in result.allocation.artifacts()? {
        let path = dir.join(artifact_file_name(artifact.kind, date));
        write_table(&artifact.table, &path)?;
        if !quiet {
            eprintln!("wrote {}", path.display());
        }
    }
    Ok(())
}

fn write_stdout(bytes: &[u8]) -> Result<(), CliError> {
    let mut out = std::io::stdout().lock();
    out.write_all(bytes)
        .and_then(|_| out.flush())
        .map_err(|e| CliError::io(format!("cannot write stdout: {e}")))
}

fn emit_result(result: &RunResult, output: &OutputArgs) -> Result<(), CliError> {
    if let Some(dir) = &output.out_dir {
        let date = resolve_date(output.date.as_deref())?;
        write_artifacts(result, dir, &date, output.quiet)?;
    }

    if output.json || output.output.is_some() {
        let json = serde_json::to_string_pretty(result)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        if let Some(path) = &output.output {
            std::fs::write(path, &json)
                .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
            if !output.quiet {
                eprintln!("wrote {}", path.display());
            }
        }
        if output.json {
            println!("{json}");
        }
    }
    if !output.json {
        write_stdout(&encode_csv(&scorecard_table(&result.scorecard))?)?;
    }

    if !output.quiet {
        print_summary(result);
    }
    Ok(())
}

fn print_summary(result: &RunResult) {
    let s = &result.summary;
    eprintln!(
        "scorecard '{}': {} matched, {} excluded; {} of {} survive elimination (threshold {:.4}); total ownership {:.1}",
        result.meta.config_name,
        s.matched,
        s.excluded,
        s.survivors,
        s.survivors + s.eliminated,
        s.elimination_threshold,
        s.ownership_total,
    );
    if !result.excluded.is_empty() {
        eprintln!("excluded: {}", result.excluded.join(", "));
    }
}

// ============================================================================
// Commands
// ============================================================================

pub fn cmd_run(
    salary: PathBuf,
    odds: PathBuf,
    params: ParamArgs,
    threshold: Option<f64>,
    output: OutputArgs,
) -> Result<(), CliError> {
    let config = params_config(&params, threshold)?;
    // Fail on a bad date before doing any work
    resolve_date(output.date.as_deref())?;
    let (a, b) = read_pair(&config, &salary, &odds)?;
    let result = gto_recon::run(&config, &a, &b)?;
    emit_result(&result, &output)
}

pub fn cmd_score(merged: PathBuf, params: ParamArgs, output: OutputArgs) -> Result<(), CliError> {
    let config = params_config(&params, None)?;
    resolve_date(output.date.as_deref())?;
    let resolver = SchemaResolver::with_aliases(&config.aliases);
    let mut cache = DecodeCache::new();
    let table = read_source(&mut cache, &resolver, &merged, "merged", Source::Merged)?;
    let result = gto_recon::run_merged(&config, table)?;
    emit_result(&result, &output)
}

#[derive(Serialize)]
struct MatchOutput<'a> {
    matched: usize,
    excluded: &'a [String],
    candidates: &'a [MatchCandidate],
}

pub fn cmd_match(
    salary: PathBuf,
    odds: PathBuf,
    config: Option<PathBuf>,
    threshold: Option<f64>,
    json: bool,
) -> Result<(), CliError> {
    let config = apply_overrides(load_config(config.as_deref())?, threshold, None, None)?;
    let (a, b) = read_pair(&config, &salary, &odds)?;
    let joined = reconcile(&a, &b, config.reconcile.similarity_threshold)?;

    if json {
        let out = MatchOutput {
            matched: joined.matched_count(),
            excluded: &joined.excluded,
            candidates: &joined.candidates,
        };
        let text = serde_json::to_string_pretty(&out)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        println!("{text}");
    } else {
        write_stdout(&encode_csv(&joined.table)?)?;
    }

    eprintln!(
        "matched {} of {} (threshold {})",
        joined.matched_count(),
        joined.candidates.len(),
        config.reconcile.similarity_threshold
    );
    for c in joined.candidates.iter().filter(|c| !c.accepted) {
        match &c.b_name {
            Some(best) => eprintln!("  excluded: {} (closest '{best}', score {:.3})", c.a_name, c.score),
            None => eprintln!("  excluded: {} (no candidates)", c.a_name),
        }
    }
    Ok(())
}

pub fn cmd_validate(path: PathBuf) -> Result<(), CliError> {
    let config = load_config(Some(path.as_path()))?;
    let alias_count: usize = config
        .aliases
        .source_a
        .values()
        .chain(config.aliases.source_b.values())
        .map(Vec::len)
        .sum();
    eprintln!(
        "valid: '{}' threshold {}, percentile {}, target total {}, {} extra alias(es)",
        config.display_name(),
        config.reconcile.similarity_threshold,
        config.allocate.elimination_percentile,
        config.allocate.target_total,
        alias_count,
    );
    Ok(())
}
