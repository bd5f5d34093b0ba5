use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Vocabulary
// ---------------------------------------------------------------------------

/// Namespace-qualified identifier, rendered as `namespace:identifier`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Curie {
    pub namespace: String,
    pub identifier: String,
}

impl Curie {
    pub fn new(namespace: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            identifier: identifier.into(),
        }
    }

    /// Split at the first `:`. Both halves must be non-empty.
    pub fn parse(s: &str) -> Option<Self> {
        let (namespace, identifier) = s.split_once(':')?;
        let (namespace, identifier) = (namespace.trim(), identifier.trim());
        if namespace.is_empty() || identifier.is_empty() {
            return None;
        }
        Some(Self::new(namespace, identifier))
    }
}

impl fmt::Display for Curie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.identifier)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermStatus {
    /// Canonical label of the concept.
    Name,
    Synonym,
}

impl Default for TermStatus {
    fn default() -> Self {
        Self::Synonym
    }
}

impl fmt::Display for TermStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => write!(f, "name"),
            Self::Synonym => write!(f, "synonym"),
        }
    }
}

/// One surface form of a concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Term {
    pub text: String,
    pub curie: Curie,
    pub status: TermStatus,
}

// ---------------------------------------------------------------------------
// Grounding results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    CaseInsensitive,
    Normalized,
}

impl MatchKind {
    pub fn weight(self) -> f64 {
        match self {
            Self::Exact => 1.0,
            Self::CaseInsensitive => 0.9,
            Self::Normalized => 0.8,
        }
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::CaseInsensitive => write!(f, "case_insensitive"),
            Self::Normalized => write!(f, "normalized"),
        }
    }
}

/// A candidate produced by one grounding call. Score is in `[0.0, 1.0]`.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredMatch {
    pub term: Term,
    pub kind: MatchKind,
    pub score: f64,
}

/// Grounded fields of a mention. Present together or not at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grounding {
    pub curie: Curie,
    pub name: String,
    /// Rounded to two decimals.
    pub score: f64,
}

impl Grounding {
    pub fn new(curie: Curie, name: impl Into<String>, score: f64) -> Self {
        Self {
            curie,
            name: name.into(),
            score: round_score(score),
        }
    }
}

pub fn round_score(score: f64) -> f64 {
    (score * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Mentions
// ---------------------------------------------------------------------------

/// Document identifier. All-digit identifiers order numerically and come
/// before any other identifier; the rest order lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric_digits(&self) -> Option<&str> {
        if self.0.is_empty() || !self.0.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let trimmed = self.0.trim_start_matches('0');
        Some(if trimmed.is_empty() { "0" } else { trimmed })
    }
}

impl Ord for DocumentId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric_digits(), other.numeric_digits()) {
            (Some(a), Some(b)) => a
                .len()
                .cmp(&b.len())
                .then_with(|| a.cmp(b))
                .then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for DocumentId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Normalized output unit: a located span plus its optional grounding.
/// Offsets are character offsets, `start` inclusive, `end` exclusive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MentionRecord {
    pub document: DocumentId,
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub grounding: Option<Grounding>,
}

impl MentionRecord {
    /// Returns `None` for an empty or inverted span.
    pub fn new(
        document: DocumentId,
        start: usize,
        end: usize,
        text: impl Into<String>,
        grounding: Option<Grounding>,
    ) -> Option<Self> {
        if start >= end {
            return None;
        }
        Some(Self {
            document,
            start,
            end,
            text: text.into(),
            grounding,
        })
    }

    pub fn is_grounded(&self) -> bool {
        self.grounding.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineSource {
    /// Pre-delimited entity frames with explicit offsets.
    StructuredFrame,
    /// Joint span detection and grounding over raw text.
    SpanScan,
}

impl PipelineSource {
    /// Only the structured-frame pipeline can emit ungrounded mentions.
    pub fn tracks_ungrounded(self) -> bool {
        matches!(self, Self::StructuredFrame)
    }
}

impl fmt::Display for PipelineSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StructuredFrame => write!(f, "structured_frame"),
            Self::SpanScan => write!(f, "span_scan"),
        }
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconSummary {
    pub documents: usize,
    pub failed_documents: usize,
    pub records: usize,
    pub grounded: usize,
    pub ungrounded: usize,
}

/// Reconciled tables for one pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciledTables {
    pub source: PipelineSource,
    pub results: Vec<MentionRecord>,
    /// Structured-frame pipeline only.
    pub ungrounded: Option<Vec<MentionRecord>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub engine_version: String,
    pub run_at: String,
    pub target_type: String,
    pub min_score: f64,
    pub terms: usize,
    pub concepts: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curie_parse_and_display() {
        let c = Curie::parse("vaccineontology:0000031").unwrap();
        assert_eq!(c.namespace, "vaccineontology");
        assert_eq!(c.identifier, "0000031");
        assert_eq!(c.to_string(), "vaccineontology:0000031");

        // Only the first colon separates.
        let c = Curie::parse("obo:VO:0000031").unwrap();
        assert_eq!(c.namespace, "obo");
        assert_eq!(c.identifier, "VO:0000031");

        assert!(Curie::parse("no-colon").is_none());
        assert!(Curie::parse(":123").is_none());
        assert!(Curie::parse("vo:").is_none());
    }

    #[test]
    fn document_ids_order_numerically() {
        let mut ids: Vec<DocumentId> = ["10", "9", "abc", "2", "007", "7", "Abc"]
            .iter()
            .map(|s| DocumentId::from(*s))
            .collect();
        ids.sort();
        let sorted: Vec<&str> = ids.iter().map(|d| d.as_str()).collect();
        assert_eq!(sorted, vec!["2", "007", "7", "9", "10", "Abc", "abc"]);
    }

    #[test]
    fn very_long_numeric_ids_do_not_overflow() {
        let a = DocumentId::from("99999999999999999999999999999999999999999");
        let b = DocumentId::from("100000000000000000000000000000000000000000");
        assert!(a < b);
    }

    #[test]
    fn mention_rejects_empty_span() {
        assert!(MentionRecord::new("1".into(), 5, 5, "x", None).is_none());
        assert!(MentionRecord::new("1".into(), 6, 5, "x", None).is_none());
        assert!(MentionRecord::new("1".into(), 0, 5, "hello", None).is_some());
    }

    #[test]
    fn grounding_rounds_score() {
        let g = Grounding::new(Curie::new("vo", "1"), "Vaccine", 0.8549);
        assert_eq!(g.score, 0.85);
        let g = Grounding::new(Curie::new("vo", "1"), "Vaccine", 0.8551);
        assert_eq!(format!("{:.2}", g.score), "0.86");
    }

    #[test]
    fn only_structured_frames_track_ungrounded() {
        assert!(PipelineSource::StructuredFrame.tracks_ungrounded());
        assert!(!PipelineSource::SpanScan.tracks_ungrounded());
    }
}
