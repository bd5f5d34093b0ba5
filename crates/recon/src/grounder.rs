use std::collections::BTreeMap;
use std::sync::Arc;

use crate::index::TermIndex;
use crate::model::{Curie, Grounding, ScoredMatch};

/// Maps a text span to ranked candidate concepts from a shared [`TermIndex`].
///
/// Score is the match kind weight alone (exact 1.0, case-insensitive 0.9,
/// normalized 0.8). Term status only picks a concept's display name, so a
/// rebuilt index and its persisted copy score identically. Candidates below
/// `min_score` are dropped. Ranking: score descending, then curie
/// (namespace, identifier) ascending, then matched text ascending.
#[derive(Debug, Clone)]
pub struct Grounder {
    index: Arc<TermIndex>,
    min_score: f64,
}

impl Grounder {
    pub fn new(index: Arc<TermIndex>, min_score: f64) -> Self {
        Self { index, min_score }
    }

    pub fn index(&self) -> &Arc<TermIndex> {
        &self.index
    }

    pub fn min_score(&self) -> f64 {
        self.min_score
    }

    /// Ranked candidates, best first. Empty when nothing clears the threshold.
    pub fn ground(&self, text: &str) -> Vec<ScoredMatch> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        // Best hit per concept.
        let mut best: BTreeMap<&Curie, ScoredMatch> = BTreeMap::new();
        for (term, kind) in self.index.lookup(text) {
            let score = kind.weight();
            if score < self.min_score {
                continue;
            }
            let replace = match best.get(&term.curie) {
                None => true,
                Some(current) => {
                    score > current.score || (score == current.score && term.text < current.term.text)
                }
            };
            if replace {
                best.insert(
                    &term.curie,
                    ScoredMatch {
                        term: term.clone(),
                        kind,
                        score,
                    },
                );
            }
        }

        let mut ranked: Vec<ScoredMatch> = best.into_values().collect();
        ranked.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.term.curie.cmp(&b.term.curie))
                .then_with(|| a.term.text.cmp(&b.term.text))
        });
        ranked
    }

    /// Top candidate resolved to the grounded fields of a mention.
    pub fn ground_best(&self, text: &str) -> Option<Grounding> {
        let top = self.ground(text).into_iter().next()?;
        let name = self
            .index
            .display_name(&top.term.curie)
            .unwrap_or(&top.term.text)
            .to_string();
        Some(Grounding::new(top.term.curie, name, top.score))
    }
}
