//! Remote metadata collaborators.

use async_trait::async_trait;

use crate::error::Result;

pub mod crossref;
pub mod sciencedirect;

pub use crossref::{CrossRefSource, CrossRefWork};
pub use sciencedirect::{ArticleDetails, ScienceDirectClient, SearchPage};

/// The subset of a bibliographic record the pipeline enriches papers with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkMetadata {
    pub doi: Option<String>,
    pub title: Option<String>,
    pub venue: Option<String>,
    pub citation_count: Option<u32>,
}

/// Bibliographic metadata API. Callers time-box every call and treat any
/// error as "no data".
#[async_trait]
pub trait BibliographicApi: Send + Sync {
    async fn lookup_by_identifier(&self, doi: &str) -> Result<Option<WorkMetadata>>;

    /// Best match for a title. The caller decides whether the match is close enough.
    async fn lookup_by_title(&self, title: &str) -> Result<Option<WorkMetadata>>;

    async fn citation_count(&self, doi: &str) -> Result<Option<u32>> {
        Ok(self
            .lookup_by_identifier(doi)
            .await?
            .and_then(|work| work.citation_count))
    }
}
