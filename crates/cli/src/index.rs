//! `lexground index` and `lexground ground`: term index building and lookup.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Subcommand;
use serde::Serialize;

use lexground_recon::engine::{build_index, load_index, IndexSource};
use lexground_recon::index::PersistOutcome;
use lexground_recon::model::{round_score, MatchKind};
use lexground_recon::{Grounder, RunConfig};

use crate::exit_codes::{EXIT_CONFIG_INVALID, EXIT_ERROR};
use crate::CliError;

#[derive(Subcommand)]
pub enum IndexCommands {
    /// Build the term index from the terminology source and persist it
    #[command(after_help = "\
Examples:
  lexground index build --config run.toml
  lexground index build --config run.toml --force")]
    Build {
        /// Run config (TOML) with `terminology` and `index_path`
        #[arg(long, short = 'c', env = "LEXGROUND_CONFIG")]
        config: PathBuf,

        /// Replace an existing persisted index
        #[arg(long)]
        force: bool,
    },
}

pub fn cmd_index(cmd: IndexCommands) -> Result<(), CliError> {
    match cmd {
        IndexCommands::Build { config, force } => cmd_index_build(config, force),
    }
}

fn cmd_index_build(config_path: PathBuf, force: bool) -> Result<(), CliError> {
    let config = RunConfig::load(&config_path)?;
    let Some(ref index_path) = config.index_path else {
        return Err(CliError::new(EXIT_CONFIG_INVALID, "config: index_path is not set")
            .with_hint("add `index_path = \"kb/vaccines.tsv\"` to the run config"));
    };

    let (index, source) = build_index(&config, force)?;
    match source {
        IndexSource::Built { persisted: Some(PersistOutcome::Written { lines }) } => {
            eprintln!("wrote {lines} line(s) to {}", index_path.display());
        }
        IndexSource::Built { persisted: Some(PersistOutcome::Skipped) } => {
            eprintln!(
                "term index already present at {}, left unchanged (use --force to rebuild)",
                index_path.display()
            );
        }
        _ => {}
    }
    eprintln!(
        "{} term(s) across {} concept(s), longest synonym {} token(s)",
        index.len(),
        index.concept_count(),
        index.max_tokens()
    );
    Ok(())
}

#[derive(Serialize)]
struct Candidate<'a> {
    curie: String,
    name: &'a str,
    term: &'a str,
    kind: MatchKind,
    score: f64,
}

pub fn cmd_ground(config_path: PathBuf, text: String, limit: usize, json: bool) -> Result<(), CliError> {
    if text.trim().is_empty() {
        return Err(CliError::usage("text to ground must not be empty"));
    }

    let config = RunConfig::load(&config_path)?;
    let (index, _) = load_index(&config)?;
    let grounder = Grounder::new(Arc::new(index), config.min_score);

    let matches = grounder.ground(&text);
    let candidates: Vec<Candidate> = matches
        .iter()
        .take(limit)
        .map(|m| Candidate {
            curie: m.term.curie.to_string(),
            name: grounder.index().display_name(&m.term.curie).unwrap_or(&m.term.text),
            term: &m.term.text,
            kind: m.kind,
            score: round_score(m.score),
        })
        .collect();

    if json {
        let json_str = serde_json::to_string_pretty(&candidates)
            .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
        return Ok(());
    }

    if candidates.is_empty() {
        eprintln!("no candidates for '{text}' at min_score {}", config.min_score);
        return Ok(());
    }
    for c in &candidates {
        println!("{:.2}\t{}\t{}\t{} ({})", c.score, c.curie, c.name, c.term, c.kind);
    }
    Ok(())
}
