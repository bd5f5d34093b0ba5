// lexground CLI - term index building, grounding and pipeline reconciliation

mod exit_codes;
mod index;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use lexground_recon::extract::ExtractorError;
use lexground_recon::ReconError;

use exit_codes::{extractor_exit_code, recon_exit_code, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "lexground")]
#[command(about = "Ground vaccine mentions against a term index and reconcile extraction pipelines")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Only log errors
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Log per-document and per-frame detail
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build or rebuild the persisted term index
    #[command(subcommand)]
    Index(index::IndexCommands),

    /// Ground a piece of text and print the ranked candidates
    #[command(after_help = "\
Examples:
  lexground ground --config run.toml 'measles vaccine'
  lexground ground --config run.toml BCG --json
  lexground ground --config run.toml 'flu vaccine' --limit 1")]
    Ground {
        /// Run config (TOML)
        #[arg(long, short = 'c', env = "LEXGROUND_CONFIG")]
        config: PathBuf,

        /// Text to ground
        text: String,

        /// Maximum number of candidates to print
        #[arg(long, default_value_t = 5)]
        limit: usize,

        /// Output JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Run both pipelines and write the reconciled tables
    #[command(after_help = "\
Examples:
  lexground run --config run.toml
  lexground run --config run.toml --json > report.json
  RUST_LOG=debug lexground run --config run.toml")]
    Run {
        /// Run config (TOML)
        #[arg(long, short = 'c', env = "LEXGROUND_CONFIG")]
        config: PathBuf,

        /// Output the run report as JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Invoke the configured external extractor over the papers directory
    #[command(after_help = "\
Examples:
  lexground extract --config run.toml")]
    Extract {
        /// Run config (TOML) with an [extractor] section
        #[arg(long, short = 'c', env = "LEXGROUND_CONFIG")]
        config: PathBuf,
    },

    /// Parse and validate a run config without running
    Validate {
        /// Run config (TOML)
        #[arg(long, short = 'c', env = "LEXGROUND_CONFIG")]
        config: PathBuf,
    },
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  lexground-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  lexground-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

/// `info` by default; RUST_LOG overrides the flags.
fn init_logging(quiet: bool, verbose: bool) {
    let level = if quiet {
        log::LevelFilter::Error
    } else if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    let result = match cli.command {
        Commands::Index(cmd) => index::cmd_index(cmd),
        Commands::Ground { config, text, limit, json } => index::cmd_ground(config, text, limit, json),
        Commands::Run { config, json } => run::cmd_run(config, json),
        Commands::Extract { config } => run::cmd_extract(config),
        Commands::Validate { config } => run::cmd_validate(config),
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
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::TerminologySource { .. } => {
                Some("check `terminology` in the run config, or set `index_path` to a persisted index")
            }
            ReconError::IndexFormat { .. } => {
                Some("delete the persisted index or run `lexground index build --force`")
            }
            ReconError::OutputDir { .. } => Some("check that `output_dir` is writable"),
            _ => None,
        };
        Self {
            code: recon_exit_code(&err),
            message: format!("{}: {err}", err.stage()),
            hint: hint.map(String::from),
        }
    }
}

impl From<ExtractorError> for CliError {
    fn from(err: ExtractorError) -> Self {
        let hint = match &err {
            ExtractorError::Spawn { .. } => Some("check `extractor.program` is installed and on PATH".to_string()),
            _ => None,
        };
        Self {
            code: extractor_exit_code(&err),
            message: format!("extractor: {err}"),
            hint,
        }
    }
}
