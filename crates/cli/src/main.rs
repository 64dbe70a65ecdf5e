// gto - GTO ownership scorecard from salary and odds exports

mod exit_codes;
mod scorecard;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{engine_exit_code, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};
use gto_recon::model::fields;
use gto_recon::ReconError;

#[derive(Parser)]
#[command(name = "gto")]
#[command(about = "Build a GTO ownership scorecard from salary and odds exports")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile the salary and odds files, then allocate ownership
    #[command(after_help = "\
Examples:
  gto run salaries.csv odds.csv
  gto run salaries.csv odds.csv --out-dir week12/ --date 041425
  gto run salaries.csv odds.csv --config gto.toml --threshold 0.85
  gto run salaries.csv odds.csv --json --output result.json")]
    Run {
        /// Salary / projection CSV (source A)
        salary: PathBuf,

        /// Finishing-odds CSV (source B)
        odds: PathBuf,

        #[command(flatten)]
        params: ParamArgs,

        /// Minimum name similarity to accept a match (0, 1]
        #[arg(long)]
        threshold: Option<f64>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Allocate ownership over a single file already carrying both sources' columns
    #[command(after_help = "\
Examples:
  gto score merged.csv
  gto score merged.csv --out-dir out/ --target-total 450")]
    Score {
        /// Merged CSV with salary, projection and odds columns
        merged: PathBuf,

        #[command(flatten)]
        params: ParamArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Reconcile names only and print the joined table
    #[command(after_help = "\
Examples:
  gto match salaries.csv odds.csv
  gto match salaries.csv odds.csv --threshold 0.9 --json")]
    Match {
        /// Salary / projection CSV (source A)
        salary: PathBuf,

        /// Finishing-odds CSV (source B)
        odds: PathBuf,

        /// TOML parameter file (threshold and header aliases)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Minimum name similarity to accept a match (0, 1]
        #[arg(long)]
        threshold: Option<f64>,

        /// Print match candidates as JSON instead of the joined CSV
        #[arg(long)]
        json: bool,
    },

    /// Parse and validate a parameter file without running
    #[command(after_help = "\
Examples:
  gto validate gto.toml")]
    Validate {
        /// Path to the TOML parameter file
        config: PathBuf,
    },
}

/// Parameter file and allocator overrides.
#[derive(clap::Args)]
pub struct ParamArgs {
    /// TOML parameter file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Elimination percentile in [0, 1)
    #[arg(long)]
    pub percentile: Option<f64>,

    /// Total final ownership across survivors
    #[arg(long)]
    pub target_total: Option<f64>,
}

/// Where results go.
#[derive(clap::Args)]
pub struct OutputArgs {
    /// Write the five stage CSVs into this directory
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Date stamp for artifact file names, MMDDYY (default: today)
    #[arg(long, value_name = "MMDDYY")]
    pub date: Option<String>,

    /// Print the run result as JSON instead of the scorecard CSV
    #[arg(long)]
    pub json: bool,

    /// Also write the JSON run result to this file
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Suppress the summary on stderr
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  gto-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            salary,
            odds,
            params,
            threshold,
            output,
        } => scorecard::cmd_run(salary, odds, params, threshold, output),
        Commands::Score { merged, params, output } => scorecard::cmd_score(merged, params, output),
        Commands::Match {
            salary,
            odds,
            config,
            threshold,
            json,
        } => scorecard::cmd_match(salary, odds, config, threshold, json),
        Commands::Validate { config } => scorecard::cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    /// Engine error with its class-specific exit code.
    pub fn engine(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::MissingField { field, .. } => {
                let section = if fields::PROBABILITIES.contains(&field.as_str()) { "source_b" } else { "source_a" };
                Some(format!("map the provider's header with [aliases.{section}] in the config file"))
            }
            ReconError::Degenerate { .. } => {
                Some("the field is too small or too uniform to rank; check the input files".to_string())
            }
            _ => None,
        };
        Self { code: engine_exit_code(err.kind()), message: err.to_string(), hint }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<gto_io::IoError> for CliError {
    fn from(err: gto_io::IoError) -> Self {
        Self::io(err.to_string())
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        Self::engine(err)
    }
}
