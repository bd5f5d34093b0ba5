//! Term index: the canonical vocabulary used for grounding.
//!
//! Built once per run from a terminology source and never mutated afterwards.
//! The persisted form is a headerless TSV, one synonym per line:
//! `<label>\t<namespace>:<identifier>`.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use crate::error::ReconError;
use crate::model::{Curie, MatchKind, Term, TermStatus};
use crate::normalize::{exact_key, fold_case, normalize, token_count};

// ---------------------------------------------------------------------------
// Terminology source
// ---------------------------------------------------------------------------

/// One raw row of the terminology source.
#[derive(Debug, Clone, Deserialize)]
pub struct TerminologyEntry {
    pub label: String,
    pub namespace: String,
    pub identifier: String,
    /// Missing or empty means `synonym`.
    #[serde(default)]
    pub status: Option<TermStatus>,
}

impl TerminologyEntry {
    pub fn new(
        label: impl Into<String>,
        namespace: impl Into<String>,
        identifier: impl Into<String>,
        status: TermStatus,
    ) -> Self {
        Self {
            label: label.into(),
            namespace: namespace.into(),
            identifier: identifier.into(),
            status: Some(status),
        }
    }
}

/// Read the terminology source TSV (`label`, `namespace`, `identifier`,
/// optional `status`). Any failure here is fatal for the run.
pub fn load_terminology(path: &Path) -> Result<Vec<TerminologyEntry>, ReconError> {
    let data = std::fs::read_to_string(path).map_err(|e| ReconError::TerminologySource {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse_terminology(path, &data)
}

pub fn parse_terminology(path: &Path, tsv: &str) -> Result<Vec<TerminologyEntry>, ReconError> {
    let source_err = |message: String| ReconError::TerminologySource {
        path: path.to_path_buf(),
        message,
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(tsv.as_bytes());

    let mut entries = Vec::new();
    for record in reader.deserialize::<TerminologyEntry>() {
        entries.push(record.map_err(|e| source_err(e.to_string()))?);
    }
    Ok(entries)
}

// ---------------------------------------------------------------------------
// Index
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    Written { lines: usize },
    /// A persisted copy already existed; nothing was written.
    Skipped,
}

#[derive(Debug, Default)]
pub struct TermIndex {
    terms: Vec<Term>,
    names: BTreeMap<Curie, String>,
    exact: HashMap<String, Vec<usize>>,
    folded: HashMap<String, Vec<usize>>,
    normalized: HashMap<String, Vec<usize>>,
    max_tokens: usize,
}

impl TermIndex {
    /// Build from raw entries. Identical (namespace, identifier, label)
    /// triples collapse to one term; distinct synonyms are all kept.
    pub fn build<I>(entries: I) -> Result<Self, ReconError>
    where
        I: IntoIterator<Item = TerminologyEntry>,
    {
        let mut index = Self::default();
        let mut seen: HashSet<(Curie, String)> = HashSet::new();

        for (i, entry) in entries.into_iter().enumerate() {
            let label = exact_key(&entry.label);
            let namespace = entry.namespace.trim();
            let identifier = entry.identifier.trim();

            let missing = [("label", label.as_str()), ("namespace", namespace), ("identifier", identifier)]
                .into_iter()
                .find(|(_, v)| v.is_empty());
            if let Some((field, _)) = missing {
                return Err(ReconError::InvalidEntry {
                    entry: i + 1,
                    message: format!("empty {field}"),
                });
            }

            let curie = Curie::new(namespace, identifier);
            if !seen.insert((curie.clone(), label.clone())) {
                continue;
            }
            index.push(Term {
                text: label,
                curie,
                status: entry.status.unwrap_or_default(),
            });
        }

        index.assign_names();
        log::debug!(
            "term index built: {} terms, {} concepts, longest synonym {} tokens",
            index.terms.len(),
            index.names.len(),
            index.max_tokens
        );
        Ok(index)
    }

    fn push(&mut self, term: Term) {
        let idx = self.terms.len();
        self.exact.entry(exact_key(&term.text)).or_default().push(idx);
        self.folded.entry(fold_case(&term.text)).or_default().push(idx);
        let norm = normalize(&term.text);
        if !norm.is_empty() {
            self.normalized.entry(norm).or_default().push(idx);
        }
        self.max_tokens = self.max_tokens.max(token_count(&term.text));
        self.terms.push(term);
    }

    /// Display name per concept: first `name` entry, else the first label seen.
    fn assign_names(&mut self) {
        for term in &self.terms {
            if term.status == TermStatus::Name && !self.names.contains_key(&term.curie) {
                self.names.insert(term.curie.clone(), term.text.clone());
            }
        }
        for term in &self.terms {
            self.names
                .entry(term.curie.clone())
                .or_insert_with(|| term.text.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn concept_count(&self) -> usize {
        self.names.len()
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Longest synonym, in normalized tokens.
    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    pub fn display_name(&self, curie: &Curie) -> Option<&str> {
        self.names.get(curie).map(String::as_str)
    }

    /// Whether some synonym has this normalized form.
    pub fn contains_normalized(&self, normalized: &str) -> bool {
        self.normalized.contains_key(normalized)
    }

    /// All terms matching `text` under each lookup form. A term can appear
    /// more than once with different kinds; callers keep the strongest.
    pub fn lookup(&self, text: &str) -> Vec<(&Term, MatchKind)> {
        let mut hits = Vec::new();
        let tables = [
            (&self.exact, exact_key(text), MatchKind::Exact),
            (&self.folded, fold_case(text), MatchKind::CaseInsensitive),
            (&self.normalized, normalize(text), MatchKind::Normalized),
        ];
        for (table, key, kind) in tables {
            if key.is_empty() {
                continue;
            }
            if let Some(ids) = table.get(&key) {
                hits.extend(ids.iter().map(|&i| (&self.terms[i], kind)));
            }
        }
        hits
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Lines of the persisted form: concepts in curie order, display name
    /// first, then the remaining synonyms in insertion order.
    pub fn persisted_lines(&self) -> Vec<(&str, &Curie)> {
        let mut by_curie: BTreeMap<&Curie, Vec<&Term>> = BTreeMap::new();
        for term in &self.terms {
            by_curie.entry(&term.curie).or_default().push(term);
        }

        let mut lines = Vec::with_capacity(self.terms.len());
        for (curie, terms) in by_curie {
            let name = self.display_name(curie).unwrap_or_default();
            let (first, rest): (Vec<&Term>, Vec<&Term>) =
                terms.into_iter().partition(|t| t.text == name);
            for term in first.into_iter().chain(rest) {
                lines.push((term.text.as_str(), curie));
            }
        }
        lines
    }

    /// Write the persisted form unless a copy already exists at `path`.
    pub fn persist(&self, path: &Path) -> Result<PersistOutcome, ReconError> {
        if path.exists() {
            log::info!("term index already present at {}, not rewriting", path.display());
            return Ok(PersistOutcome::Skipped);
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ReconError::OutputDir {
                path: parent.to_path_buf(),
                message: e.to_string(),
            })?;
        }

        let lines = self.persisted_lines();
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_writer(Vec::new());
        for (label, curie) in &lines {
            writer
                .write_record([*label, curie.to_string().as_str()])
                .map_err(|e| ReconError::Io(e.to_string()))?;
        }
        let bytes = writer.into_inner().map_err(|e| ReconError::Io(e.to_string()))?;

        // Write beside the target and rename, so an interrupted write never
        // leaves a truncated file that later runs would mistake for a cache.
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, bytes)
            .and_then(|_| std::fs::rename(&tmp, path))
            .map_err(|e| ReconError::Io(format!("cannot write {}: {e}", path.display())))?;

        log::info!("wrote {} term index lines to {}", lines.len(), path.display());
        Ok(PersistOutcome::Written { lines: lines.len() })
    }

    /// Rebuild an index from its persisted form. The first label per curie
    /// becomes the concept's display name.
    pub fn load_persisted(path: &Path) -> Result<Self, ReconError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| ReconError::Io(format!("cannot read {}: {e}", path.display())))?;
        Self::parse_persisted(path, &data)
    }

    pub fn parse_persisted(path: &Path, tsv: &str) -> Result<Self, ReconError> {
        let format_err = |line: usize, message: String| ReconError::IndexFormat {
            path: path.to_path_buf(),
            line,
            message,
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .from_reader(tsv.as_bytes());

        let mut named: HashSet<Curie> = HashSet::new();
        let mut entries = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let line = i + 1;
            let record = record.map_err(|e| format_err(line, e.to_string()))?;
            if record.len() != 2 {
                return Err(format_err(line, format!("expected 2 fields, found {}", record.len())));
            }
            let curie = Curie::parse(&record[1])
                .ok_or_else(|| format_err(line, format!("invalid curie '{}'", &record[1])))?;
            let status = if named.insert(curie.clone()) {
                TermStatus::Name
            } else {
                TermStatus::Synonym
            };
            entries.push(TerminologyEntry::new(
                &record[0],
                curie.namespace,
                curie.identifier,
                status,
            ));
        }

        Self::build(entries)
    }
}
