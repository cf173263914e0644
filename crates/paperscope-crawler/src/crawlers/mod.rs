//! Source crawlers. Each one draws its own queries, fetches raw records and
//! normalizes them into [`IngestRecord`]s for the runner.

use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use paperscope_core::{IngestRecord, SearchString};
use paperscope_science::{RawRecord, RecordNormalizer, SourceKind, Vocabulary};
use tracing::{info, warn};

use crate::error::Result;

pub mod feed;
pub mod page;
pub mod rest;

pub use feed::FeedCrawler;
pub use page::PageCrawler;
pub use rest::RestCrawler;

#[async_trait]
pub trait Crawler: Send {
    fn name(&self) -> &str;

    /// Database tag stamped on every paper this crawler produces.
    fn database(&self) -> &str;

    fn export_dir(&self) -> Option<&Path>;

    /// Crawl fresh queries. `existing` holds the search strings already
    /// stored, which are never drawn again.
    async fn crawl(&mut self, existing: &HashSet<String>) -> Result<Vec<IngestRecord>>;

    /// Release whatever the crawl held open.
    async fn close(&mut self) {}
}

/// Keyword file when configured, the built-in vocabulary otherwise.
pub fn load_vocabulary(keyword_file: Option<&str>) -> Result<Vocabulary> {
    match keyword_file {
        Some(path) => {
            let vocabulary = Vocabulary::from_csv(Path::new(path))?;
            info!(path, "loaded keyword file");
            Ok(vocabulary)
        }
        None => Ok(Vocabulary::default()),
    }
}

/// Normalize `raw` and pair it with its query. Records without a title are
/// dropped; a record with malformed fields is logged and dropped.
pub(crate) async fn to_record(
    normalizer: &RecordNormalizer,
    raw: &RawRecord,
    kind: SourceKind,
    database: &str,
    search_string: &SearchString,
) -> Option<IngestRecord> {
    match normalizer.normalize(raw, kind).await {
        Ok(Some(paper)) => Some(IngestRecord::new(
            paper.with_database(database),
            search_string.clone(),
        )),
        Ok(None) => None,
        Err(e) => {
            warn!(database, query = %search_string.name, error = %e, "dropping malformed record");
            None
        }
    }
}
