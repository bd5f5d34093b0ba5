//! TSV serialization of reconciled tables.
//!
//! Every table uses the same header and column order. Absent grounded
//! fields are written as empty strings; scores always carry two decimals.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::ReconError;
use crate::model::MentionRecord;

pub const COLUMNS: [&str; 7] = ["pubmed", "start", "end", "text", "curie", "name", "score"];

#[derive(Serialize)]
struct Row<'a> {
    pubmed: &'a str,
    start: usize,
    end: usize,
    text: &'a str,
    curie: String,
    name: &'a str,
    score: String,
}

impl<'a> From<&'a MentionRecord> for Row<'a> {
    fn from(r: &'a MentionRecord) -> Self {
        let g = r.grounding.as_ref();
        Row {
            pubmed: r.document.as_str(),
            start: r.start,
            end: r.end,
            text: &r.text,
            curie: g.map(|g| g.curie.to_string()).unwrap_or_default(),
            name: g.map(|g| g.name.as_str()).unwrap_or_default(),
            score: g.map(|g| format!("{:.2}", g.score)).unwrap_or_default(),
        }
    }
}

/// Write header + rows. Rows are written in the order given.
pub fn write_table<W: Write>(writer: W, rows: &[MentionRecord]) -> Result<(), ReconError> {
    let mut tsv = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(writer);

    let io_err = |e: csv::Error| ReconError::Io(e.to_string());

    tsv.write_record(COLUMNS).map_err(io_err)?;
    for record in rows {
        tsv.serialize(Row::from(record)).map_err(io_err)?;
    }
    tsv.flush().map_err(|e| ReconError::Io(e.to_string()))
}

pub fn render_table(rows: &[MentionRecord]) -> Result<String, ReconError> {
    let mut buf = Vec::new();
    write_table(&mut buf, rows)?;
    String::from_utf8(buf).map_err(|e| ReconError::Io(e.to_string()))
}

/// Sibling path a table is staged at before it is moved into place.
pub fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Write every table or none of them.
///
/// Each table goes to its staging path first. Only when all of them are on
/// disk are they renamed over their targets. On failure the staged files are
/// removed and no target is touched.
pub fn write_tables(tables: &[(PathBuf, String)]) -> Result<(), ReconError> {
    let mut staged: Vec<PathBuf> = Vec::with_capacity(tables.len());

    for (path, contents) in tables {
        let tmp = staging_path(path);
        if let Err(e) = std::fs::write(&tmp, contents) {
            discard(&staged);
            return Err(ReconError::Io(format!("cannot write {}: {e}", tmp.display())));
        }
        staged.push(tmp);
    }

    for (i, (path, _)) in tables.iter().enumerate() {
        if let Err(e) = std::fs::rename(&staged[i], path) {
            discard(&staged[i..]);
            return Err(ReconError::Io(format!("cannot write {}: {e}", path.display())));
        }
    }
    Ok(())
}

fn discard(staged: &[PathBuf]) {
    for tmp in staged {
        if let Err(e) = std::fs::remove_file(tmp) {
            log::warn!("cannot remove staged table {}: {e}", tmp.display());
        }
    }
}
