use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::config::RunConfig;
use crate::error::{DocumentError, DocumentErrorKind, ReconError};
use crate::extract::has_suffix;
use crate::frames::{document_id_from_path, parse_frame_document, FrameAdapter};
use crate::grounder::Grounder;
use crate::index::{load_terminology, PersistOutcome, TermIndex};
use crate::model::{DocumentId, MentionRecord, PipelineSource, ReconSummary, ReconciledTables, RunMeta};
use crate::output::{render_table, write_tables};
use crate::reconcile::{reconcile, summarize};
use crate::scan::{ScanAdapter, SpanDetector};

// ---------------------------------------------------------------------------
// Index
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexSource {
    /// Loaded from an existing persisted copy.
    Persisted(PathBuf),
    /// Built from the terminology source.
    Built { persisted: Option<PersistOutcome> },
}

/// Load the persisted index when present, otherwise build it from the
/// terminology source and persist it (if `index_path` is configured).
pub fn load_index(config: &RunConfig) -> Result<(TermIndex, IndexSource), ReconError> {
    if let Some(ref path) = config.index_path {
        if path.exists() {
            log::info!("loading persisted term index from {}", path.display());
            let index = TermIndex::load_persisted(path)?;
            return Ok((index, IndexSource::Persisted(path.clone())));
        }
    }
    build_index(config, false)
}

/// Build from the terminology source. With `force`, an existing persisted
/// copy is replaced; otherwise it is left alone.
pub fn build_index(config: &RunConfig, force: bool) -> Result<(TermIndex, IndexSource), ReconError> {
    log::info!("building term index from {}", config.terminology.display());
    let entries = load_terminology(&config.terminology)?;
    let index = TermIndex::build(entries)?;
    log::info!(
        "term index: {} terms across {} concepts",
        index.len(),
        index.concept_count()
    );

    let persisted = match config.index_path {
        Some(ref path) => {
            if force && path.exists() {
                std::fs::remove_file(path).map_err(|e| {
                    ReconError::Io(format!("cannot replace {}: {e}", path.display()))
                })?;
            }
            Some(index.persist(path)?)
        }
        None => None,
    };

    Ok((index, IndexSource::Built { persisted }))
}

// ---------------------------------------------------------------------------
// Pipelines
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub tables: ReconciledTables,
    pub summary: ReconSummary,
    pub failures: Vec<DocumentError>,
}

/// Documents in `dir` whose file name ends in `suffix`, sorted by id.
pub fn list_documents(dir: &Path, suffix: &str) -> Result<Vec<(DocumentId, PathBuf)>, ReconError> {
    let input_err = |message: String| ReconError::InputDir {
        path: dir.to_path_buf(),
        message,
    };

    let mut docs = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| input_err(e.to_string()))? {
        let path = entry.map_err(|e| input_err(e.to_string()))?.path();
        if !path.is_file() || !has_suffix(&path, suffix) {
            continue;
        }
        match document_id_from_path(&path) {
            Some(id) => docs.push((id, path)),
            None => log::warn!("{}: no document id in file name, skipped", path.display()),
        }
    }
    docs.sort();
    Ok(docs)
}

fn document_failure(
    failures: &mut Vec<DocumentError>,
    document: &DocumentId,
    path: &Path,
    kind: DocumentErrorKind,
    message: String,
) {
    let err = DocumentError {
        document: document.to_string(),
        path: path.to_path_buf(),
        kind,
        message,
    };
    log::warn!("skipping {err}");
    failures.push(err);
}

/// Structured-frame pipeline over every structured output in `dir`.
pub fn run_structured(
    dir: &Path,
    suffix: &str,
    target_type: &str,
    grounder: &Grounder,
) -> Result<PipelineReport, ReconError> {
    let docs = list_documents(dir, suffix)?;
    log::info!("structured frames: {} document(s) in {}", docs.len(), dir.display());

    let adapter = FrameAdapter::new(grounder, target_type);
    let mut records: Vec<MentionRecord> = Vec::new();
    let mut failures = Vec::new();

    for (document, path) in &docs {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) => {
                document_failure(&mut failures, document, path, DocumentErrorKind::Unreadable, e.to_string());
                continue;
            }
        };
        match parse_frame_document(&json) {
            Ok(doc) => records.extend(adapter.adapt(document, &doc)),
            Err(e) => {
                document_failure(&mut failures, document, path, DocumentErrorKind::Malformed, e.to_string());
            }
        }
    }

    let tables = reconcile(PipelineSource::StructuredFrame, records);
    let summary = summarize(&tables, docs.len(), &failures);
    log::info!(
        "structured frames: {} record(s), {} ungrounded, {} document(s) skipped",
        summary.records,
        summary.ungrounded,
        summary.failed_documents
    );
    Ok(PipelineReport {
        tables,
        summary,
        failures,
    })
}

/// Span-scanning pipeline over every `<docid>.txt` paper in `dir`.
pub fn run_span_scan(dir: &Path, grounder: &Grounder) -> Result<PipelineReport, ReconError> {
    let docs = list_documents(dir, ".txt")?;
    log::info!("span scan: {} document(s) in {}", docs.len(), dir.display());

    let adapter = ScanAdapter::new(SpanDetector::new(Arc::clone(grounder.index())), grounder);
    let mut records: Vec<MentionRecord> = Vec::new();
    let mut failures = Vec::new();

    for (document, path) in &docs {
        match std::fs::read_to_string(path) {
            Ok(text) => records.extend(adapter.adapt(document, &text)),
            Err(e) => {
                document_failure(&mut failures, document, path, DocumentErrorKind::Unreadable, e.to_string());
            }
        }
    }

    let tables = reconcile(PipelineSource::SpanScan, records);
    let summary = summarize(&tables, docs.len(), &failures);
    log::info!(
        "span scan: {} record(s), {} document(s) skipped",
        summary.records,
        summary.failed_documents
    );
    Ok(PipelineReport {
        tables,
        summary,
        failures,
    })
}

// ---------------------------------------------------------------------------
// Full run
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub source: PipelineSource,
    pub summary: ReconSummary,
    pub failures: Vec<DocumentError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub meta: RunMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured: Option<PipelineOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_scan: Option<PipelineOutcome>,
    pub written: Vec<PathBuf>,
}

fn outcome(report: &PipelineReport) -> PipelineOutcome {
    PipelineOutcome {
        source: report.tables.source,
        summary: report.summary.clone(),
        failures: report.failures.clone(),
    }
}

/// Create the output directory and make sure files can be created in it.
fn ensure_output_dir(dir: &Path) -> Result<(), ReconError> {
    let output_dir_error = |e: std::io::Error| ReconError::OutputDir {
        path: dir.to_path_buf(),
        message: e.to_string(),
    };
    std::fs::create_dir_all(dir).map_err(output_dir_error)?;

    let check = dir.join(".lexground-write-check");
    std::fs::write(&check, b"").map_err(output_dir_error)?;
    std::fs::remove_file(&check).map_err(output_dir_error)
}

/// Run every configured pipeline and write its tables.
///
/// Tables are rendered in memory and only written once all pipelines have
/// finished, then staged and renamed together, so a fatal error leaves no
/// partial output behind.
pub fn run(config: &RunConfig) -> Result<RunReport, ReconError> {
    ensure_output_dir(&config.output_dir)?;

    let (index, _) = load_index(config)?;
    let index = Arc::new(index);
    let grounder = Grounder::new(Arc::clone(&index), config.min_score);

    let mut pending: Vec<(PathBuf, String)> = Vec::new();
    let mut structured = None;
    let mut span_scan = None;

    if let Some(ref dir) = config.inputs.structured_dir {
        let report = run_structured(dir, &config.inputs.structured_suffix, &config.target_type, &grounder)?;
        pending.push((
            config.output_dir.join(&config.output.structured_results),
            render_table(&report.tables.results)?,
        ));
        if let Some(ref ungrounded) = report.tables.ungrounded {
            pending.push((
                config.output_dir.join(&config.output.structured_ungrounded),
                render_table(ungrounded)?,
            ));
        }
        structured = Some(outcome(&report));
    }

    if let Some(ref dir) = config.inputs.papers_dir {
        let report = run_span_scan(dir, &grounder)?;
        pending.push((
            config.output_dir.join(&config.output.span_scan_results),
            render_table(&report.tables.results)?,
        ));
        span_scan = Some(outcome(&report));
    }

    write_tables(&pending)?;
    let written: Vec<PathBuf> = pending.into_iter().map(|(path, _)| path).collect();
    for path in &written {
        log::info!("wrote {}", path.display());
    }

    Ok(RunReport {
        meta: RunMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            target_type: config.target_type.clone(),
            min_score: config.min_score,
            terms: index.len(),
            concepts: index.concept_count(),
        },
        structured,
        span_scan,
        written,
    })
}
