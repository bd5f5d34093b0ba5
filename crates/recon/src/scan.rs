//! Span-scanning adapter: raw text → grounded mentions.
//!
//! Two stages that the adapter always runs together but that are usable on
//! their own: [`SpanDetector`] finds uninterpreted spans whose normalized
//! form is a known synonym, then the [`Grounder`] scores each span. Spans
//! that do not ground are dropped, so this adapter never emits ungrounded
//! records.

use std::sync::Arc;

use crate::grounder::Grounder;
use crate::index::TermIndex;
use crate::model::{DocumentId, MentionRecord};
use crate::normalize::normalize;

/// A detected span. Offsets are character offsets into the scanned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

#[derive(Debug, Clone, Copy)]
struct Token {
    start: usize,
    end: usize,
    byte_start: usize,
    byte_end: usize,
    sentence: usize,
}

/// Word tokens (maximal alphanumeric runs) tagged with a sentence number.
/// A sentence ends at `.`, `!`, `?` or `;` followed by whitespace or the end
/// of the text, so "1.5" and "e.g.," stay within one sentence.
fn tokenize(text: &str) -> Vec<Token> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut tokens = Vec::new();
    let mut sentence = 0;
    let mut open: Option<(usize, usize)> = None;

    for (ci, &(bi, c)) in chars.iter().enumerate() {
        if c.is_alphanumeric() {
            if open.is_none() {
                open = Some((ci, bi));
            }
            continue;
        }

        if let Some((start, byte_start)) = open.take() {
            tokens.push(Token {
                start,
                end: ci,
                byte_start,
                byte_end: bi,
                sentence,
            });
        }

        let at_boundary = chars.get(ci + 1).map_or(true, |(_, next)| next.is_whitespace());
        if matches!(c, '.' | '!' | '?' | ';') && at_boundary {
            sentence += 1;
        }
    }

    if let Some((start, byte_start)) = open {
        tokens.push(Token {
            start,
            end: chars.len(),
            byte_start,
            byte_end: text.len(),
            sentence,
        });
    }

    tokens
}

/// Greedy longest-first n-gram scan against the index's normalized synonyms.
#[derive(Debug, Clone)]
pub struct SpanDetector {
    index: Arc<TermIndex>,
}

impl SpanDetector {
    pub fn new(index: Arc<TermIndex>) -> Self {
        Self { index }
    }

    /// Non-overlapping spans in text order.
    pub fn detect(&self, text: &str) -> Vec<Span> {
        self.detect_with(text, |_| Some(()))
            .into_iter()
            .map(|(span, ())| span)
            .collect()
    }

    /// Like [`detect`](Self::detect), but each candidate must also pass
    /// `accept`. A rejected candidate falls back to shorter n-grams at the
    /// same start token before the scan moves on.
    pub fn detect_with<T, F>(&self, text: &str, mut accept: F) -> Vec<(Span, T)>
    where
        F: FnMut(&Span) -> Option<T>,
    {
        let tokens = tokenize(text);
        let max_len = self.index.max_tokens();
        let mut found = Vec::new();

        let mut i = 0;
        while i < tokens.len() {
            let first = tokens[i];
            let limit = max_len.min(tokens.len() - i);

            let hit = (1..=limit).rev().find_map(|len| {
                let last = tokens[i + len - 1];
                if last.sentence != first.sentence {
                    return None;
                }
                let surface = &text[first.byte_start..last.byte_end];
                if !self.index.contains_normalized(&normalize(surface)) {
                    return None;
                }
                let span = Span {
                    start: first.start,
                    end: last.end,
                    text: surface.to_string(),
                };
                let value = accept(&span)?;
                Some((len, span, value))
            });

            match hit {
                Some((len, span, value)) => {
                    found.push((span, value));
                    i += len;
                }
                None => i += 1,
            }
        }

        found
    }
}

pub struct ScanAdapter<'a> {
    detector: SpanDetector,
    grounder: &'a Grounder,
}

impl<'a> ScanAdapter<'a> {
    pub fn new(detector: SpanDetector, grounder: &'a Grounder) -> Self {
        Self { detector, grounder }
    }

    /// Grounded mention records for one document, in text order. A span
    /// that fails the grounder's threshold gives way to shorter spans inside
    /// it.
    pub fn adapt(&self, document: &DocumentId, text: &str) -> Vec<MentionRecord> {
        self.detector
            .detect_with(text, |span| {
                let grounding = self.grounder.ground_best(&span.text);
                if grounding.is_none() {
                    log::debug!(
                        "document {document}: span '{}' [{}, {}) below threshold, trying shorter",
                        span.text,
                        span.start,
                        span.end
                    );
                }
                grounding
            })
            .into_iter()
            .filter_map(|(span, grounding)| {
                MentionRecord::new(document.clone(), span.start, span.end, span.text, Some(grounding))
            })
            .collect()
    }
}
