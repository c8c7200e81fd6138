use std::io;
use std::path::Path;

use csv::{Reader, StringRecord};
use tracing::{debug, warn};

use crate::error::{AnalysisError, Result};
use crate::model::{Category, ContentItem, InteractionEdge};

const EDGE_COLUMNS: [&str; 4] = ["source", "target", "subreddit", "created_utc"];
const CONTENT_COLUMNS: [&str; 3] = ["author", "subreddit", "created_utc"];

/// Positions of named columns within a header row.
struct Columns<const N: usize> {
    idx: [usize; N],
}

impl<const N: usize> Columns<N> {
    fn locate(headers: &StringRecord, names: [&str; N], table: &str) -> Result<Self> {
        let mut idx = [0; N];
        for (slot, name) in idx.iter_mut().zip(names) {
            *slot = position(headers, name).ok_or_else(|| {
                AnalysisError::Data(format!("{table} table is missing required column '{name}'"))
            })?;
        }
        Ok(Self { idx })
    }

    fn get<'r>(&self, record: &'r StringRecord, i: usize) -> &'r str {
        record.get(self.idx[i]).unwrap_or("").trim()
    }
}

fn position(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

/// Read an edge table. The category comes from which table this is, not from
/// any `category` column in the file.
pub fn read_edges<R: io::Read>(reader: R, category: Category) -> Result<Vec<InteractionEdge>> {
    let mut rdr = Reader::from_reader(reader);
    let cols = Columns::locate(rdr.headers()?, EDGE_COLUMNS, "edge")?;

    let mut edges = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        let source = cols.get(&record, 0);
        let target = cols.get(&record, 1);
        // header is line 1
        let line = row + 2;
        if source.is_empty() {
            return Err(AnalysisError::Data(format!("edge row {line} has a null source")));
        }
        if target.is_empty() {
            return Err(AnalysisError::Data(format!("edge row {line} has a null target")));
        }
        edges.push(InteractionEdge::new(
            source,
            target,
            cols.get(&record, 2),
            category,
            cols.get(&record, 3),
        ));
    }

    debug!(%category, rows = edges.len(), "read edge table");
    Ok(edges)
}

/// Read a content table. Rows without an author are deleted accounts and are skipped.
pub fn read_content<R: io::Read>(reader: R, category: Category) -> Result<Vec<ContentItem>> {
    let mut rdr = Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();
    let cols = Columns::locate(&headers, CONTENT_COLUMNS, "content")?;
    let id_col = position(&headers, "id");
    let category_col = position(&headers, "category");

    let mut items = Vec::new();
    let mut skipped = 0usize;
    for record in rdr.records() {
        let record = record?;
        let author = cols.get(&record, 0);
        if author.is_empty() {
            skipped += 1;
            continue;
        }
        let row_category = match category_col.and_then(|c| record.get(c)) {
            Some(raw) if !raw.trim().is_empty() => raw.parse()?,
            _ => category,
        };
        items.push(ContentItem {
            id: id_col
                .and_then(|c| record.get(c))
                .unwrap_or("")
                .to_string(),
            author: author.to_string(),
            subreddit: cols.get(&record, 1).to_string(),
            category: row_category,
            created_utc: cols.get(&record, 2).to_string(),
        });
    }

    if skipped > 0 {
        warn!(%category, skipped, "skipped content rows without an author");
    }
    debug!(%category, rows = items.len(), "read content table");
    Ok(items)
}

pub fn load_edges(path: impl AsRef<Path>, category: Category) -> Result<Vec<InteractionEdge>> {
    read_edges(std::fs::File::open(path)?, category)
}

pub fn load_content(path: impl AsRef<Path>, category: Category) -> Result<Vec<ContentItem>> {
    read_content(std::fs::File::open(path)?, category)
}
