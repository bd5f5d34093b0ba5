//! Structured-frame adapter: entity frames with explicit offsets → mentions.
//!
//! Input documents are JSON records of the form
//! `{"frames": [{"type": "vaccine", "text": "...", "start-pos": {"offset": 10},
//! "end-pos": {"offset": 26}}, ...]}`. Only frames whose `type` equals the
//! configured target type are used; every kept frame yields one record,
//! grounded or not.

use std::path::Path;

use serde::Deserialize;

use crate::grounder::Grounder;
use crate::model::{DocumentId, MentionRecord};

#[derive(Debug, Clone, Deserialize)]
pub struct FrameDocument {
    pub frames: Vec<EntityFrame>,
}

/// Every field is optional: frames of other types routinely omit them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntityFrame {
    #[serde(rename = "type", default)]
    pub frame_type: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(rename = "start-pos", default)]
    pub start_pos: Option<Position>,
    #[serde(rename = "end-pos", default)]
    pub end_pos: Option<Position>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Position {
    pub offset: usize,
}

pub fn parse_frame_document(json: &str) -> Result<FrameDocument, serde_json::Error> {
    serde_json::from_str(json)
}

/// Document id from a structured output file name: everything before the
/// first `.`, so `12345.uaz.entities.json` → `12345`.
pub fn document_id_from_path(path: &Path) -> Option<DocumentId> {
    let name = path.file_name()?.to_str()?;
    let stem = name.split('.').next().unwrap_or_default();
    if stem.is_empty() {
        None
    } else {
        Some(DocumentId::new(stem))
    }
}

pub struct FrameAdapter<'a> {
    grounder: &'a Grounder,
    target_type: &'a str,
}

impl<'a> FrameAdapter<'a> {
    pub fn new(grounder: &'a Grounder, target_type: &'a str) -> Self {
        Self {
            grounder,
            target_type,
        }
    }

    /// Mention records for one document, in frame order.
    ///
    /// A target-type frame with no text, no offsets or an empty span is
    /// skipped with a warning; the rest of the document is still used.
    pub fn adapt(&self, document: &DocumentId, doc: &FrameDocument) -> Vec<MentionRecord> {
        let mut records = Vec::new();

        for (i, frame) in doc.frames.iter().enumerate() {
            if frame.frame_type.as_deref() != Some(self.target_type) {
                continue;
            }

            let (Some(text), Some(start), Some(end)) = (
                frame.text.as_deref(),
                frame.start_pos.as_ref().map(|p| p.offset),
                frame.end_pos.as_ref().map(|p| p.offset),
            ) else {
                log::warn!("document {document}: frame {i} lacks text or offsets, skipped");
                continue;
            };

            let grounding = self.grounder.ground_best(text);
            log::debug!(
                "document {document}: frame {i} '{text}' [{start}, {end}) -> {}",
                grounding
                    .as_ref()
                    .map(|g| g.curie.to_string())
                    .unwrap_or_else(|| "ungrounded".into())
            );

            match MentionRecord::new(document.clone(), start, end, text, grounding) {
                Some(record) => records.push(record),
                None => log::warn!("document {document}: frame {i} has empty span [{start}, {end}), skipped"),
            }
        }

        records
    }
}
