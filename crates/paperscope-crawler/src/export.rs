//! Flat CSV export of a crawl's records.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use paperscope_core::IngestRecord;
use serde::Serialize;
use tracing::info;

use crate::error::Result;

const LIST_DELIMITER: &str = ",";

#[derive(Debug, Serialize)]
struct PaperRow<'a> {
    title: &'a str,
    publication_date: Option<String>,
    pub_type: Option<&'a str>,
    content_type: Option<&'a str>,
    #[serde(rename = "abstract")]
    abstract_text: Option<&'a str>,
    full_text: Option<&'a str>,
    citation_count: Option<u32>,
    doi: Option<&'a str>,
    url: Option<&'a str>,
    source: Option<&'a str>,
    authors: String,
    tags: String,
    databases: String,
    search_string: &'a str,
}

impl<'a> From<&'a IngestRecord> for PaperRow<'a> {
    fn from(record: &'a IngestRecord) -> Self {
        let paper = &record.paper;
        Self {
            title: &paper.title,
            publication_date: paper.publication_date.map(|d| d.format("%Y-%m-%d").to_string()),
            pub_type: paper.publication_type.as_deref(),
            content_type: paper.content_type.as_deref(),
            abstract_text: paper.abstract_text.as_deref(),
            full_text: paper.full_text.as_deref(),
            citation_count: paper.citation_count,
            doi: paper.doi.as_deref(),
            url: paper.url.as_deref(),
            source: paper.source.as_deref(),
            authors: paper.authors.join(LIST_DELIMITER),
            tags: paper.tags.join(LIST_DELIMITER),
            databases: paper.databases.join(LIST_DELIMITER),
            search_string: &record.search_string.name,
        }
    }
}

/// Write `records` to `<dir>/<database>/papers.csv`, one row per distinct
/// title (first occurrence wins). Returns the file path.
pub fn write_papers_csv(dir: &Path, database: &str, records: &[IngestRecord]) -> Result<PathBuf> {
    let directory = dir.join(database);
    std::fs::create_dir_all(&directory)?;
    let path = directory.join("papers.csv");

    let mut writer = csv::Writer::from_path(&path)?;
    let mut seen = HashSet::new();
    for record in records {
        if seen.insert(record.paper.title.as_str()) {
            writer.serialize(PaperRow::from(record))?;
        }
    }
    writer.flush()?;

    info!(path = %path.display(), rows = seen.len(), "exported papers");
    Ok(path)
}
