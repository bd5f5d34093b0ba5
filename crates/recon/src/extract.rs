//! Seam to the external extraction tool that turns raw papers into
//! structured frame documents. The engine never reimplements the tool; it
//! only runs it and collects what it produced.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::frames::document_id_from_path;

#[derive(Debug)]
pub enum ExtractorError {
    /// The tool could not be started.
    Spawn { program: String, message: String },
    /// The tool ran and exited unsuccessfully.
    Failed { program: String, status: Option<i32>, stderr: String },
    /// Listing the tool's output failed.
    Io(String),
}

impl fmt::Display for ExtractorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn { program, message } => write!(f, "cannot start '{program}': {message}"),
            Self::Failed { program, status, stderr } => {
                match status {
                    Some(code) => write!(f, "'{program}' exited with status {code}")?,
                    None => write!(f, "'{program}' was terminated by a signal")?,
                }
                if !stderr.trim().is_empty() {
                    write!(f, ": {}", stderr.trim())?;
                }
                Ok(())
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ExtractorError {}

/// Turns raw documents into structured extraction outputs.
pub trait Extractor {
    /// Returns the structured output files produced for `documents`, sorted.
    fn extract(&self, documents: &[PathBuf]) -> Result<Vec<PathBuf>, ExtractorError>;
}

/// Runs an external command as `<program> <args...> <input_dir> <output_dir>`
/// and collects output files ending in `output_suffix`.
#[derive(Debug, Clone)]
pub struct CommandExtractor {
    pub program: String,
    pub args: Vec<String>,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub output_suffix: String,
}

impl CommandExtractor {
    fn outputs_for(&self, documents: &[PathBuf]) -> Result<Vec<PathBuf>, ExtractorError> {
        let wanted: Vec<String> = documents
            .iter()
            .filter_map(|p| document_id_from_path(p))
            .map(|d| d.as_str().to_string())
            .collect();

        let entries = std::fs::read_dir(&self.output_dir).map_err(|e| {
            ExtractorError::Io(format!("cannot list {}: {e}", self.output_dir.display()))
        })?;

        let mut outputs = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| ExtractorError::Io(e.to_string()))?.path();
            if !has_suffix(&path, &self.output_suffix) {
                continue;
            }
            let produced = document_id_from_path(&path)
                .map(|d| wanted.iter().any(|w| w == d.as_str()))
                .unwrap_or(false);
            if produced {
                outputs.push(path);
            }
        }
        outputs.sort();
        Ok(outputs)
    }
}

impl Extractor for CommandExtractor {
    fn extract(&self, documents: &[PathBuf]) -> Result<Vec<PathBuf>, ExtractorError> {
        std::fs::create_dir_all(&self.output_dir).map_err(|e| {
            ExtractorError::Io(format!("cannot create {}: {e}", self.output_dir.display()))
        })?;

        log::info!(
            "running {} {} on {} document(s)",
            self.program,
            self.args.join(" "),
            documents.len()
        );

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(&self.input_dir)
            .arg(&self.output_dir)
            .output()
            .map_err(|e| ExtractorError::Spawn {
                program: self.program.clone(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(ExtractorError::Failed {
                program: self.program.clone(),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let outputs = self.outputs_for(documents)?;
        if outputs.len() < documents.len() {
            log::warn!(
                "extractor produced output for {} of {} document(s)",
                outputs.len(),
                documents.len()
            );
        }
        Ok(outputs)
    }
}

pub(crate) fn has_suffix(path: &Path, suffix: &str) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.ends_with(suffix) && n.len() > suffix.len())
        .unwrap_or(false)
}
