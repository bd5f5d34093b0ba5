use std::cmp::Ordering;

use crate::error::DocumentError;
use crate::model::{MentionRecord, PipelineSource, ReconSummary, ReconciledTables};

/// Total order over mention records: (document, start, end, text), then the
/// grounded fields so that no two distinct records compare equal.
pub fn compare_records(a: &MentionRecord, b: &MentionRecord) -> Ordering {
    a.document
        .cmp(&b.document)
        .then_with(|| a.start.cmp(&b.start))
        .then_with(|| a.end.cmp(&b.end))
        .then_with(|| a.text.cmp(&b.text))
        .then_with(|| match (&a.grounding, &b.grounding) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(x), Some(y)) => x
                .curie
                .cmp(&y.curie)
                .then_with(|| x.name.cmp(&y.name))
                .then_with(|| x.score.total_cmp(&y.score)),
        })
}

/// Sort one pipeline's records and, for the structured-frame pipeline,
/// derive the ungrounded summary. Records themselves are never modified.
pub fn reconcile(source: PipelineSource, mut records: Vec<MentionRecord>) -> ReconciledTables {
    records.sort_by(compare_records);

    let ungrounded = source.tracks_ungrounded().then(|| {
        records
            .iter()
            .filter(|r| !r.is_grounded())
            .cloned()
            .collect::<Vec<_>>()
    });

    if !source.tracks_ungrounded() && records.iter().any(|r| !r.is_grounded()) {
        log::warn!("{source}: ungrounded records present in a pipeline that should not emit them");
    }

    ReconciledTables {
        source,
        results: records,
        ungrounded,
    }
}

pub fn summarize(
    tables: &ReconciledTables,
    documents: usize,
    failures: &[DocumentError],
) -> ReconSummary {
    let grounded = tables.results.iter().filter(|r| r.is_grounded()).count();
    ReconSummary {
        documents,
        failed_documents: failures.len(),
        records: tables.results.len(),
        grounded,
        ungrounded: tables.results.len() - grounded,
    }
}
