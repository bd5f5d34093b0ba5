//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                                 |
//! |---------|------------------|---------------------------------------------|
//! | 0       | Universal        | Success (also when documents were skipped)  |
//! | 1       | Universal        | General error (unspecified)                 |
//! | 2       | Universal        | CLI usage error (bad args)                  |
//! | 3-9     | config           | Run config parse/validation                 |
//! | 10-19   | terminology      | Terminology source and persisted index      |
//! | 20-29   | input            | Input directories                           |
//! | 30-39   | output           | Output directory and table writes           |
//! | 40-49   | extractor        | External extraction tool                    |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `recon_exit_code` / `extractor_exit_code`

use lexground_recon::extract::ExtractorError;
use lexground_recon::ReconError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed. Skipped documents do not change this.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Config (3-9)
// =============================================================================

/// Config file unreadable or not valid TOML for a run config.
pub const EXIT_CONFIG_PARSE: u8 = 3;

/// Config parsed but failed validation (threshold range, missing inputs).
pub const EXIT_CONFIG_INVALID: u8 = 4;

// =============================================================================
// Terminology / index (10-19)
// =============================================================================

/// Terminology source missing, unreadable, or structurally invalid.
pub const EXIT_TERMINOLOGY: u8 = 10;

/// Terminology entry with an empty label, namespace or identifier.
pub const EXIT_TERMINOLOGY_ENTRY: u8 = 11;

/// Persisted term index cannot be parsed.
pub const EXIT_INDEX_FORMAT: u8 = 12;

// =============================================================================
// Input (20-29)
// =============================================================================

/// Input directory cannot be listed.
pub const EXIT_INPUT_DIR: u8 = 20;

// =============================================================================
// Output (30-39)
// =============================================================================

/// Output directory cannot be created.
pub const EXIT_OUTPUT_DIR: u8 = 30;

/// A table or the persisted index could not be written.
pub const EXIT_OUTPUT_WRITE: u8 = 31;

// =============================================================================
// Extractor (40-49)
// =============================================================================

/// Extraction tool could not be started.
pub const EXIT_EXTRACTOR_SPAWN: u8 = 40;

/// Extraction tool exited unsuccessfully.
pub const EXIT_EXTRACTOR_FAILED: u8 = 41;

/// Extraction tool's output directory could not be listed.
pub const EXIT_EXTRACTOR_IO: u8 = 42;

// =============================================================================
// Error mapping
// =============================================================================

/// Map a fatal engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) => EXIT_CONFIG_PARSE,
        ReconError::ConfigValidation(_) => EXIT_CONFIG_INVALID,
        ReconError::TerminologySource { .. } => EXIT_TERMINOLOGY,
        ReconError::InvalidEntry { .. } => EXIT_TERMINOLOGY_ENTRY,
        ReconError::IndexFormat { .. } => EXIT_INDEX_FORMAT,
        ReconError::InputDir { .. } => EXIT_INPUT_DIR,
        ReconError::OutputDir { .. } => EXIT_OUTPUT_DIR,
        ReconError::Io(_) => EXIT_OUTPUT_WRITE,
    }
}

pub fn extractor_exit_code(err: &ExtractorError) -> u8 {
    match err {
        ExtractorError::Spawn { .. } => EXIT_EXTRACTOR_SPAWN,
        ExtractorError::Failed { .. } => EXIT_EXTRACTOR_FAILED,
        ExtractorError::Io(_) => EXIT_EXTRACTOR_IO,
    }
}
