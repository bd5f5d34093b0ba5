use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ReconError;
use crate::extract::CommandExtractor;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Everything a run needs. Passed explicitly to each component; nothing
/// reads ambient state.
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Terminology source TSV (`label`, `namespace`, `identifier`[, `status`]).
    pub terminology: PathBuf,
    /// Persisted term index. Built from `terminology` when missing.
    #[serde(default)]
    pub index_path: Option<PathBuf>,
    pub output_dir: PathBuf,
    #[serde(default = "default_target_type")]
    pub target_type: String,
    #[serde(default = "default_min_score")]
    pub min_score: f64,
    #[serde(default)]
    pub inputs: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub extractor: Option<ExtractorConfig>,
}

fn default_target_type() -> String {
    "vaccine".into()
}

fn default_min_score() -> f64 {
    0.5
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// Structured extraction outputs, one file per document.
    #[serde(default)]
    pub structured_dir: Option<PathBuf>,
    #[serde(default = "default_structured_suffix")]
    pub structured_suffix: String,
    /// Raw `<docid>.txt` papers.
    #[serde(default)]
    pub papers_dir: Option<PathBuf>,
}

fn default_structured_suffix() -> String {
    ".uaz.entities.json".into()
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            structured_dir: None,
            structured_suffix: default_structured_suffix(),
            papers_dir: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_structured_results")]
    pub structured_results: String,
    #[serde(default = "default_structured_ungrounded")]
    pub structured_ungrounded: String,
    #[serde(default = "default_span_scan_results")]
    pub span_scan_results: String,
}

fn default_structured_results() -> String {
    "structured_results.tsv".into()
}

fn default_structured_ungrounded() -> String {
    "structured_ungrounded.tsv".into()
}

fn default_span_scan_results() -> String {
    "span_scan_results.tsv".into()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            structured_results: default_structured_results(),
            structured_ungrounded: default_structured_ungrounded(),
            span_scan_results: default_span_scan_results(),
        }
    }
}

// ---------------------------------------------------------------------------
// External extractor
// ---------------------------------------------------------------------------

/// Invoked as `<program> <args...> <papers_dir> <structured_dir>`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractorConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl RunConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: RunConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file. Relative paths resolve
    /// against the file's directory.
    pub fn load(path: &Path) -> Result<Self, ReconError> {
        let input = std::fs::read_to_string(path).map_err(|e| {
            ReconError::ConfigParse(format!("cannot read {}: {e}", path.display()))
        })?;
        let mut config = Self::from_toml(&input)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.resolve_paths(base);
        Ok(config)
    }

    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.terminology);
        resolve(&mut self.output_dir);
        if let Some(p) = self.index_path.as_mut() {
            resolve(p);
        }
        if let Some(p) = self.inputs.structured_dir.as_mut() {
            resolve(p);
        }
        if let Some(p) = self.inputs.papers_dir.as_mut() {
            resolve(p);
        }
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if !self.min_score.is_finite() || !(0.0..=1.0).contains(&self.min_score) {
            return Err(ReconError::ConfigValidation(format!(
                "min_score must be between 0 and 1, got {}",
                self.min_score
            )));
        }

        if self.target_type.trim().is_empty() {
            return Err(ReconError::ConfigValidation("target_type must not be empty".into()));
        }

        if self.inputs.structured_dir.is_none() && self.inputs.papers_dir.is_none() {
            return Err(ReconError::ConfigValidation(
                "at least one of inputs.structured_dir or inputs.papers_dir is required".into(),
            ));
        }

        if self.inputs.structured_suffix.is_empty() {
            return Err(ReconError::ConfigValidation(
                "inputs.structured_suffix must not be empty".into(),
            ));
        }

        let names = [
            &self.output.structured_results,
            &self.output.structured_ungrounded,
            &self.output.span_scan_results,
        ];
        if names.iter().any(|n| n.trim().is_empty()) {
            return Err(ReconError::ConfigValidation("output file names must not be empty".into()));
        }
        for (i, a) in names.iter().enumerate() {
            if names[i + 1..].contains(a) {
                return Err(ReconError::ConfigValidation(format!(
                    "output file name '{a}' is used for more than one table"
                )));
            }
        }

        if let Some(ref extractor) = self.extractor {
            if extractor.program.trim().is_empty() {
                return Err(ReconError::ConfigValidation("extractor.program must not be empty".into()));
            }
            if self.inputs.structured_dir.is_none() || self.inputs.papers_dir.is_none() {
                return Err(ReconError::ConfigValidation(
                    "extractor requires both inputs.papers_dir and inputs.structured_dir".into(),
                ));
            }
        }

        Ok(())
    }

    /// The configured external extractor, wired to the input directories.
    pub fn command_extractor(&self) -> Option<CommandExtractor> {
        let extractor = self.extractor.as_ref()?;
        Some(CommandExtractor {
            program: extractor.program.clone(),
            args: extractor.args.clone(),
            input_dir: self.inputs.papers_dir.clone()?,
            output_dir: self.inputs.structured_dir.clone()?,
            output_suffix: self.inputs.structured_suffix.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
