//! `lexground-recon`: Term grounding and cross-pipeline mention reconciliation.
//!
//! Builds a term index from a terminology source, grounds text spans
//! against it, adapts two extraction pipelines (structured entity frames
//! and raw-text span scanning) into one mention record shape, and writes
//! deterministic TSV tables for comparing them.
//!
//! No CLI dependencies. Filesystem access is confined to `index`
//! persistence, `engine` batch drivers, `extract`, and `output`.

pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod frames;
pub mod grounder;
pub mod index;
pub mod model;
pub mod normalize;
pub mod output;
pub mod reconcile;
pub mod scan;

pub use config::RunConfig;
pub use engine::{run, RunReport};
pub use error::{DocumentError, ReconError};
pub use grounder::Grounder;
pub use index::TermIndex;
pub use model::{Curie, DocumentId, Grounding, MentionRecord, PipelineSource};
pub use reconcile::reconcile;
