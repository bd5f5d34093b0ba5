//! `lexground run`, `extract` and `validate`: config-driven pipeline runs.

use std::path::PathBuf;

use lexground_recon::engine::list_documents;
use lexground_recon::extract::Extractor;
use lexground_recon::RunConfig;

use crate::exit_codes::{EXIT_CONFIG_INVALID, EXIT_ERROR};
use crate::CliError;

pub fn cmd_run(config_path: PathBuf, json_output: bool) -> Result<(), CliError> {
    let config = RunConfig::load(&config_path)?;
    let report = lexground_recon::run(&config)?;

    if json_output {
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    // Human summary to stderr
    for outcome in [&report.structured, &report.span_scan].into_iter().flatten() {
        let s = &outcome.summary;
        eprintln!(
            "{}: {} document(s), {} record(s), {} grounded, {} ungrounded, {} skipped",
            outcome.source, s.documents, s.records, s.grounded, s.ungrounded, s.failed_documents,
        );
        for failure in &outcome.failures {
            eprintln!("  skipped {failure}");
        }
    }
    for path in &report.written {
        eprintln!("wrote {}", path.display());
    }

    Ok(())
}

pub fn cmd_extract(config_path: PathBuf) -> Result<(), CliError> {
    let config = RunConfig::load(&config_path)?;
    let extractor = config.command_extractor().ok_or_else(|| {
        CliError::new(EXIT_CONFIG_INVALID, "config: no [extractor] section")
            .with_hint("add [extractor] with `program` (and optional `args`) to the run config")
    })?;

    let documents: Vec<PathBuf> = list_documents(&extractor.input_dir, ".txt")?
        .into_iter()
        .map(|(_, path)| path)
        .collect();
    let outputs = extractor.extract(&documents)?;

    for path in &outputs {
        println!("{}", path.display());
    }
    eprintln!(
        "extractor produced {} output(s) for {} document(s)",
        outputs.len(),
        documents.len()
    );
    Ok(())
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = RunConfig::load(&config_path)?;

    let pipelines: Vec<&str> = [
        config.inputs.structured_dir.as_ref().map(|_| "structured_frame"),
        config.inputs.papers_dir.as_ref().map(|_| "span_scan"),
    ]
    .into_iter()
    .flatten()
    .collect();

    eprintln!(
        "valid: target type '{}', min_score {}, pipelines: {}",
        config.target_type,
        config.min_score,
        pipelines.join(", "),
    );
    if !config.terminology.exists() && !config.index_path.as_ref().is_some_and(|p| p.exists()) {
        eprintln!(
            "warning: terminology source {} does not exist and no persisted index is present",
            config.terminology.display()
        );
    }
    Ok(())
}
