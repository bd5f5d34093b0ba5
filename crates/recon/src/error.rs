use std::fmt;
use std::path::PathBuf;

/// Run-ending errors. Anything here aborts the whole run before output is written.
#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad threshold, empty target type, etc.).
    ConfigValidation(String),
    /// Terminology source missing, unreadable, or structurally invalid.
    TerminologySource { path: PathBuf, message: String },
    /// Persisted term index line that cannot be parsed.
    IndexFormat { path: PathBuf, line: usize, message: String },
    /// A terminology entry with an empty label, namespace or identifier.
    InvalidEntry { entry: usize, message: String },
    /// Input directory (papers, structured outputs) cannot be listed.
    InputDir { path: PathBuf, message: String },
    /// Output directory cannot be created or written.
    OutputDir { path: PathBuf, message: String },
    /// IO error (file write, etc.).
    Io(String),
}

impl ReconError {
    /// Short name of the stage that failed, used in user-facing messages.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::ConfigParse(_) | Self::ConfigValidation(_) => "config",
            Self::TerminologySource { .. } | Self::InvalidEntry { .. } => "terminology",
            Self::IndexFormat { .. } => "index",
            Self::InputDir { .. } => "input",
            Self::OutputDir { .. } | Self::Io(_) => "output",
        }
    }
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::TerminologySource { path, message } => {
                write!(f, "terminology source '{}': {message}", path.display())
            }
            Self::IndexFormat { path, line, message } => {
                write!(f, "term index '{}', line {line}: {message}", path.display())
            }
            Self::InvalidEntry { entry, message } => {
                write!(f, "terminology entry {entry}: {message}")
            }
            Self::InputDir { path, message } => {
                write!(f, "input directory '{}': {message}", path.display())
            }
            Self::OutputDir { path, message } => {
                write!(f, "output directory '{}': {message}", path.display())
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}

// ---------------------------------------------------------------------------
// Per-document failures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentErrorKind {
    /// The file could not be read.
    Unreadable,
    /// The file was read but its content is not a valid document.
    Malformed,
}

/// A single document that was skipped. Never ends the run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DocumentError {
    pub document: String,
    pub path: PathBuf,
    pub kind: DocumentErrorKind,
    pub message: String,
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            DocumentErrorKind::Unreadable => "unreadable",
            DocumentErrorKind::Malformed => "malformed",
        };
        write!(
            f,
            "document '{}' ({}) is {kind}: {}",
            self.document,
            self.path.display(),
            self.message
        )
    }
}

impl std::error::Error for DocumentError {}
