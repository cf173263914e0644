//! Source-specific raw records to canonical papers.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use paperscope_core::{CanonicalPaper, FaultTolerantStep, Recovery};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Result, ScienceError};
use crate::identifiers::find_doi;
use crate::sources::{BibliographicApi, WorkMetadata};

pub mod fields;

/// Untyped record as a source hands it over.
pub type RawRecord = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Fields scraped from a search engine's detail page.
    Page,
    /// Atom feed entries.
    Feed,
    /// Publisher search API hits merged with article details.
    Rest,
}

impl SourceKind {
    pub fn allowed_keys(self) -> &'static [&'static str] {
        match self {
            SourceKind::Page => &[
                "title",
                "publication_date",
                "source",
                "doi",
                "abstract",
                "tags",
                "authors",
                "url",
                "citation_count",
            ],
            SourceKind::Feed => &[
                "title",
                "authors",
                "links",
                "link",
                "published",
                "summary",
                "tags",
                "arxiv_doi",
            ],
            SourceKind::Rest => &[
                "title",
                "authors",
                "loadDate",
                "sourceTitle",
                "doi",
                "uri",
                "abstract",
                "tags",
                "pub_type",
                "content_type",
                "full_text",
                "citation_count",
            ],
        }
    }

    /// Source key to canonical key.
    pub fn renames(self) -> &'static [(&'static str, &'static str)] {
        match self {
            SourceKind::Page => &[],
            SourceKind::Feed => &[
                ("link", "url"),
                ("published", "publication_date"),
                ("summary", "abstract"),
                ("arxiv_doi", "doi"),
            ],
            SourceKind::Rest => &[
                ("loadDate", "publication_date"),
                ("sourceTitle", "source"),
                ("uri", "url"),
            ],
        }
    }
}

fn any_lookup_failure(_: &ScienceError) -> bool {
    true
}

/// Maps raw records onto [`CanonicalPaper`], filling a missing DOI and venue
/// from a bibliographic API. Lookup failures never fail a record.
pub struct RecordNormalizer {
    api: Arc<dyn BibliographicApi>,
    timeout: Duration,
    lookup: FaultTolerantStep<Option<WorkMetadata>, ScienceError>,
}

impl RecordNormalizer {
    pub fn new(api: Arc<dyn BibliographicApi>, timeout: Duration) -> Self {
        Self {
            api,
            timeout,
            lookup: FaultTolerantStep::new(any_lookup_failure, None),
        }
    }

    pub fn api(&self) -> &Arc<dyn BibliographicApi> {
        &self.api
    }

    /// `Ok(None)` when the record has no title. A malformed date is an error.
    pub async fn normalize(&self, raw: &RawRecord, kind: SourceKind) -> Result<Option<CanonicalPaper>> {
        let record = fields::project(raw, kind);

        let Some(title) = fields::text(record.get("title")) else {
            debug!(?kind, "dropping record without title");
            return Ok(None);
        };

        let mut paper = CanonicalPaper::new(title);
        paper.publication_date = fields::date("publication_date", record.get("publication_date"))?;
        paper.abstract_text = fields::text(record.get("abstract"));
        paper.full_text = fields::raw_text(record.get("full_text"));
        paper.publication_type = fields::text(record.get("pub_type"));
        paper.content_type = fields::text(record.get("content_type"));
        paper.citation_count = fields::count(record.get("citation_count"));
        paper.url = fields::raw_text(record.get("url"));
        paper.source = fields::text(record.get("source"));
        paper.tags = fields::string_list(record.get("tags"));
        paper.authors = fields::string_list(record.get("authors"));
        paper.doi = fields::raw_text(record.get("doi"));

        if paper.doi.is_none() {
            paper.doi = match doi_from_links(record.get("links")) {
                Some(doi) => Some(doi),
                None => self.doi_from_title(&paper.title).await?,
            };
        }

        if paper.source.is_none()
            && let Some(doi) = paper.doi.clone()
        {
            paper.source = self.venue(&doi).await?;
        }

        Ok(Some(paper))
    }

    async fn time_boxed<F>(&self, what: &str, call: F) -> Result<Option<WorkMetadata>>
    where
        F: Future<Output = Result<Option<WorkMetadata>>>,
    {
        let result = match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ScienceError::Timeout(what.to_string())),
        };
        if let Err(e) = &result {
            debug!(error = %e, what, "lookup failed");
        }
        self.lookup.recover(result, Recovery::Fallback)
    }

    /// DOI of the best title match, accepted only on a case-insensitive
    /// exact title match.
    async fn doi_from_title(&self, title: &str) -> Result<Option<String>> {
        let found = self
            .time_boxed("title lookup", self.api.lookup_by_title(title))
            .await?;

        Ok(found.and_then(|work| {
            let matches = work
                .title
                .as_deref()
                .is_some_and(|t| fields::clean_text(t).to_lowercase() == title.to_lowercase());
            if matches {
                work.doi
            } else {
                debug!(title, candidate = ?work.title, "title lookup rejected");
                None
            }
        }))
    }

    /// Citation count for `doi`; `None` when the lookup fails or times out.
    pub async fn citation_count(&self, doi: &str) -> Option<u32> {
        match tokio::time::timeout(self.timeout, self.api.citation_count(doi)).await {
            Ok(Ok(count)) => count,
            Ok(Err(e)) => {
                debug!(error = %e, doi, "citation lookup failed");
                None
            }
            Err(_) => {
                debug!(doi, "citation lookup timed out");
                None
            }
        }
    }

    async fn venue(&self, doi: &str) -> Result<Option<String>> {
        let found = self
            .time_boxed("venue lookup", self.api.lookup_by_identifier(doi))
            .await?;
        Ok(found.and_then(|work| work.venue))
    }
}

/// DOI carried by an alternate link: a link titled `doi`, else any href
/// with a DOI-shaped fragment.
fn doi_from_links(links: Option<&Value>) -> Option<String> {
    let links = links?.as_array()?;
    let href = |link: &Value| link["href"].as_str().map(str::to_string);

    links
        .iter()
        .filter(|link| link["title"].as_str() == Some("doi"))
        .chain(links.iter())
        .filter_map(href)
        .find_map(|h| find_doi(&h))
        .map(|doi| doi.normalized)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct MockApi {
        title_reply: Option<WorkMetadata>,
        venue: Option<String>,
        fail: bool,
        hang: bool,
        title_calls: AtomicUsize,
        identifier_calls: AtomicUsize,
    }

    #[async_trait]
    impl BibliographicApi for MockApi {
        async fn lookup_by_identifier(&self, doi: &str) -> Result<Option<WorkMetadata>> {
            self.identifier_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ScienceError::ApiError(doi.to_string(), "HTTP 500".into()));
            }
            Ok(Some(WorkMetadata {
                doi: Some(doi.to_string()),
                venue: self.venue.clone(),
                ..Default::default()
            }))
        }

        async fn lookup_by_title(&self, _title: &str) -> Result<Option<WorkMetadata>> {
            self.title_calls.fetch_add(1, Ordering::SeqCst);
            if self.hang {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            if self.fail {
                return Err(ScienceError::ApiError("title".into(), "HTTP 503".into()));
            }
            Ok(self.title_reply.clone())
        }
    }

    fn reply(title: &str, doi: &str) -> Option<WorkMetadata> {
        Some(WorkMetadata {
            title: Some(title.to_string()),
            doi: Some(doi.to_string()),
            ..Default::default()
        })
    }

    fn normalizer(api: Arc<MockApi>) -> RecordNormalizer {
        RecordNormalizer::new(api, Duration::from_millis(50))
    }

    fn raw(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    fn feed_record(title: &str) -> RawRecord {
        raw(json!({
            "title": title,
            "authors": [{"name": "Ada Lovelace"}],
            "links": [{"href": "http://arxiv.org/abs/2101.00001v1", "rel": "alternate"}],
            "link": "http://arxiv.org/abs/2101.00001v1",
            "published": "2021-01-04T17:57:40Z",
            "summary": "Offsets\n from soil.",
            "tags": [{"term": "econ.GN"}],
            "arxiv_doi": null
        }))
    }

    #[tokio::test]
    async fn title_lookup_accepts_case_insensitive_match() {
        let api = Arc::new(MockApi {
            title_reply: reply("Carbon markets 101", "10.1000/cm101"),
            ..Default::default()
        });
        let paper = normalizer(api.clone())
            .normalize(&feed_record("Carbon Markets 101"), SourceKind::Feed)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(paper.doi.as_deref(), Some("10.1000/cm101"));
        assert_eq!(api.title_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn title_lookup_rejects_different_title() {
        let api = Arc::new(MockApi {
            title_reply: reply("Carbon Markets 102", "10.1000/cm102"),
            ..Default::default()
        });
        let paper = normalizer(api.clone())
            .normalize(&feed_record("Carbon Markets 101"), SourceKind::Feed)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(paper.doi, None);
        assert_eq!(paper.source, None);
        assert_eq!(api.title_calls.load(Ordering::SeqCst), 1);
        assert_eq!(api.identifier_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn alternate_link_doi_skips_title_lookup() {
        let api = Arc::new(MockApi {
            title_reply: reply("Carbon Markets 101", "10.1000/wrong"),
            venue: Some("Land Use Policy".into()),
            ..Default::default()
        });
        let mut record = feed_record("Carbon Markets 101");
        record.insert(
            "links".into(),
            json!([
                {"href": "http://arxiv.org/abs/2101.00001v1", "rel": "alternate"},
                {"href": "http://dx.doi.org/10.1016/j.lup.2019.104", "title": "doi", "rel": "related"}
            ]),
        );

        let paper = normalizer(api.clone())
            .normalize(&record, SourceKind::Feed)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(paper.doi.as_deref(), Some("10.1016/j.lup.2019.104"));
        assert_eq!(paper.source.as_deref(), Some("Land Use Policy"));
        assert_eq!(api.title_calls.load(Ordering::SeqCst), 0);
        assert_eq!(api.identifier_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn feed_fields_are_cleaned_and_renamed() {
        let api = Arc::new(MockApi::default());
        let mut record = feed_record("  Carbon\n   Markets ");
        record.insert("arxiv_doi".into(), json!("10.1000/xyz"));

        let paper = normalizer(api.clone())
            .normalize(&record, SourceKind::Feed)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(paper.title, "Carbon Markets");
        assert_eq!(paper.abstract_text.as_deref(), Some("Offsets from soil."));
        assert_eq!(paper.url.as_deref(), Some("http://arxiv.org/abs/2101.00001v1"));
        assert_eq!(paper.publication_date, NaiveDate::from_ymd_opt(2021, 1, 4));
        assert_eq!(paper.tags, vec!["econ.GN"]);
        assert_eq!(paper.authors, vec!["Ada Lovelace"]);
        assert_eq!(paper.doi.as_deref(), Some("10.1000/xyz"));
        assert_eq!(api.title_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failing_and_slow_lookups_yield_unknown() {
        let failing = Arc::new(MockApi {
            fail: true,
            ..Default::default()
        });
        let paper = normalizer(failing)
            .normalize(&feed_record("Soil carbon"), SourceKind::Feed)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(paper.doi, None);

        let slow = Arc::new(MockApi {
            hang: true,
            title_reply: reply("Soil carbon", "10.1000/late"),
            ..Default::default()
        });
        let paper = normalizer(slow.clone())
            .normalize(&feed_record("Soil carbon"), SourceKind::Feed)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(paper.doi, None);
        assert_eq!(slow.title_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn venue_lookup_failure_is_unknown() {
        let api = Arc::new(MockApi {
            fail: true,
            ..Default::default()
        });
        let record = raw(json!({"title": "Soil", "doi": "10.1000/soil"}));
        let paper = normalizer(api.clone())
            .normalize(&record, SourceKind::Page)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(paper.source, None);
        assert_eq!(api.identifier_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn citation_lookup_failure_is_unknown() {
        let api = Arc::new(MockApi {
            fail: true,
            ..Default::default()
        });
        assert_eq!(normalizer(api.clone()).citation_count("10.1000/soil").await, None);
        assert_eq!(api.identifier_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_title_is_dropped() {
        let api = Arc::new(MockApi::default());
        let record = raw(json!({"title": "   ", "doi": "10.1000/x"}));
        let result = normalizer(api.clone())
            .normalize(&record, SourceKind::Page)
            .await
            .unwrap();
        assert!(result.is_none());
        assert_eq!(api.identifier_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn malformed_date_propagates() {
        let api = Arc::new(MockApi::default());
        let record = raw(json!({"title": "Soil", "publication_date": "sometime", "source": "Nature"}));
        let err = normalizer(api)
            .normalize(&record, SourceKind::Page)
            .await
            .unwrap_err();
        assert!(matches!(err, ScienceError::InvalidDate(..)));
    }

    #[tokio::test]
    async fn rest_keys_are_projected() {
        let api = Arc::new(MockApi::default());
        let record = raw(json!({
            "title": "Forest offsets",
            "authors": [{"name": "Alan Turing", "order": 1}],
            "loadDate": "2019-03-01T00:00:00.000Z",
            "sourceTitle": "Forest Policy and Economics",
            "doi": "10.1016/j.forpol.2019.1",
            "uri": "https://www.sciencedirect.com/science/article/pii/S1",
            "pub_type": "fla",
            "content_type": "Journal",
            "citation_count": 4,
            "openaccess": true
        }));
        let paper = normalizer(api.clone())
            .normalize(&record, SourceKind::Rest)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(paper.source.as_deref(), Some("Forest Policy and Economics"));
        assert_eq!(paper.publication_date, NaiveDate::from_ymd_opt(2019, 3, 1));
        assert_eq!(paper.publication_type.as_deref(), Some("fla"));
        assert_eq!(paper.citation_count, Some(4));
        assert_eq!(paper.authors, vec!["Alan Turing"]);
        assert_eq!(api.identifier_calls.load(Ordering::SeqCst), 0);
    }
}
