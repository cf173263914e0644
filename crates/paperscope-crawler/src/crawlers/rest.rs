use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use paperscope_core::{IngestRecord, RestCrawlerConfig};
use paperscope_science::sources::{ArticleDetails, ScienceDirectClient};
use paperscope_science::{
    QuerySyntax, RawRecord, RecordNormalizer, ScienceError, SearchStringGenerator, SourceKind,
    Vocabulary,
};
use rand::rngs::StdRng;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::{Crawler, to_record};
use crate::error::Result;

#[derive(Debug, Clone, Default)]
struct Enrichment {
    details: Option<ArticleDetails>,
    citation_count: Option<u32>,
}

/// Publisher search API crawler. Hits are paged through, then merged with
/// the article endpoint's details and a citation count.
pub struct RestCrawler {
    config: RestCrawlerConfig,
    export_dir: Option<PathBuf>,
    client: ScienceDirectClient,
    generator: SearchStringGenerator<StdRng>,
    normalizer: Arc<RecordNormalizer>,
    /// Per-DOI lookups made during this crawler's lifetime.
    enrichments: HashMap<String, Enrichment>,
}

impl RestCrawler {
    pub fn new(
        config: RestCrawlerConfig,
        api_key: &str,
        vocabulary: Vocabulary,
        normalizer: Arc<RecordNormalizer>,
    ) -> Result<Self> {
        let client = ScienceDirectClient::with_params(
            &config.base_url,
            &config.article_url,
            api_key,
            Duration::from_millis(config.request_delay_ms),
        )?;
        let generator = SearchStringGenerator::new(vocabulary, QuerySyntax::Plain);
        Ok(Self::with_parts(config, client, generator, normalizer))
    }

    pub fn with_parts(
        config: RestCrawlerConfig,
        client: ScienceDirectClient,
        generator: SearchStringGenerator<StdRng>,
        normalizer: Arc<RecordNormalizer>,
    ) -> Self {
        Self {
            export_dir: config.export_dir.as_ref().map(PathBuf::from),
            generator: generator.with_max_terms(config.nb_keywords),
            config,
            client,
            normalizer,
            enrichments: HashMap::new(),
        }
    }

    /// Every hit for `query`, up to `truncate`. A rate-limited page is
    /// skipped; any other failure ends paging for the query.
    async fn search_all(&self, query: &str) -> Vec<RawRecord> {
        let page_size = self.config.page_size.max(1);
        let mut hits = Vec::new();
        let mut offset = 0u32;
        let mut to_retrieve = None;

        loop {
            match self
                .client
                .search(query, &self.config.date_range, offset, page_size)
                .await
            {
                Ok(page) => {
                    let bound = *to_retrieve
                        .get_or_insert(page.results_found.min(self.config.truncate));
                    debug!(query, offset, found = page.results_found, bound, "search page");
                    hits.extend(page.results);
                }
                Err(ScienceError::RateLimit(_, wait)) => {
                    warn!(query, offset, retry_after = wait, "search page rate limited, skipping");
                }
                Err(e) => {
                    warn!(query, offset, error = %e, "search failed");
                    break;
                }
            }

            offset += page_size;
            match to_retrieve {
                Some(bound) if offset < bound => {}
                _ => break,
            }
        }
        hits
    }

    async fn enrichment(&mut self, doi: &str) -> Enrichment {
        if let Some(known) = self.enrichments.get(doi) {
            return known.clone();
        }

        let details = match self.client.article(doi).await {
            Ok(details) => details,
            Err(e) => {
                warn!(doi, error = %e, "article lookup failed");
                None
            }
        };
        let enrichment = Enrichment {
            details,
            citation_count: self.normalizer.citation_count(doi).await,
        };
        self.enrichments.insert(doi.to_string(), enrichment.clone());
        enrichment
    }

    /// Merge article details into a hit. Only the publication type is kept
    /// for types outside `allowed_pub_types`.
    async fn enrich(&mut self, mut hit: RawRecord) -> RawRecord {
        let Some(doi) = hit.get("doi").and_then(Value::as_str).map(str::to_string) else {
            return hit;
        };
        let enrichment = self.enrichment(&doi).await;

        if let Some(count) = enrichment.citation_count {
            hit.insert("citation_count".into(), json!(count));
        }
        let Some(details) = enrichment.details else {
            return hit;
        };

        hit.insert("pub_type".into(), json!(details.pub_type));
        let allowed = details
            .pub_type
            .as_deref()
            .is_some_and(|t| self.config.allowed_pub_types.iter().any(|a| a == t));
        if allowed {
            hit.insert("tags".into(), json!(details.tags));
            hit.insert("content_type".into(), json!(details.content_type));
            if details.abstract_text.is_some() {
                hit.insert("abstract".into(), json!(details.abstract_text));
            }
            hit.insert("full_text".into(), json!(details.full_text));
        }
        hit
    }
}

#[async_trait]
impl Crawler for RestCrawler {
    fn name(&self) -> &str {
        "rest"
    }

    fn database(&self) -> &str {
        &self.config.database
    }

    fn export_dir(&self) -> Option<&Path> {
        self.export_dir.as_deref()
    }

    async fn crawl(&mut self, existing: &HashSet<String>) -> Result<Vec<IngestRecord>> {
        let queries = self.generator.generate_distinct(self.config.nb_queries, existing);
        let mut records = Vec::new();

        for search_string in &queries {
            let hits = self.search_all(&search_string.name).await;
            debug!(query = %search_string.name, hits = hits.len(), "search answered");

            for hit in hits {
                let raw = self.enrich(hit).await;
                if let Some(record) = to_record(
                    &self.normalizer,
                    &raw,
                    SourceKind::Rest,
                    &self.config.database,
                    search_string,
                )
                .await
                {
                    records.push(record);
                }
            }
        }

        info!(queries = queries.len(), records = records.len(), "rest crawl finished");
        Ok(records)
    }
}
