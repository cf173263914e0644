use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use paperscope_core::{FeedCrawlerConfig, IngestRecord};
use paperscope_science::arxiv::FeedClient;
use paperscope_science::{QuerySyntax, RecordNormalizer, SearchStringGenerator, SourceKind, Vocabulary};
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use super::{Crawler, to_record};
use crate::error::Result;

/// Spacing the arXiv API asks clients to keep between calls.
const FEED_INTERVAL: Duration = Duration::from_secs(3);

/// Atom feed API crawler.
pub struct FeedCrawler {
    config: FeedCrawlerConfig,
    export_dir: Option<PathBuf>,
    client: FeedClient,
    generator: SearchStringGenerator<StdRng>,
    normalizer: Arc<RecordNormalizer>,
}

impl FeedCrawler {
    pub fn new(
        config: FeedCrawlerConfig,
        vocabulary: Vocabulary,
        normalizer: Arc<RecordNormalizer>,
    ) -> Result<Self> {
        let client = FeedClient::with_params(&config.base_url, FEED_INTERVAL)?;
        let generator = SearchStringGenerator::new(vocabulary, QuerySyntax::Arxiv);
        Ok(Self::with_parts(config, client, generator, normalizer))
    }

    pub fn with_parts(
        config: FeedCrawlerConfig,
        client: FeedClient,
        generator: SearchStringGenerator<StdRng>,
        normalizer: Arc<RecordNormalizer>,
    ) -> Self {
        Self {
            export_dir: config.export_dir.as_ref().map(PathBuf::from),
            generator: generator.with_max_terms(config.nb_keywords),
            config,
            client,
            normalizer,
        }
    }
}

#[async_trait]
impl Crawler for FeedCrawler {
    fn name(&self) -> &str {
        "feed"
    }

    fn database(&self) -> &str {
        &self.config.database
    }

    fn export_dir(&self) -> Option<&Path> {
        self.export_dir.as_deref()
    }

    async fn crawl(&mut self, existing: &HashSet<String>) -> Result<Vec<IngestRecord>> {
        let queries = self.generator.generate_distinct(self.config.nb_queries, existing);
        let limit = Some(self.config.paper_limit_per_query);
        let mut records = Vec::new();

        for search_string in &queries {
            let entries = match self.client.search(&search_string.name, limit).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(query = %search_string.name, error = %e, "feed query failed");
                    continue;
                }
            };
            debug!(query = %search_string.name, entries = entries.len(), "feed query answered");

            for entry in entries {
                let raw = entry.into_raw();
                if let Some(record) = to_record(
                    &self.normalizer,
                    &raw,
                    SourceKind::Feed,
                    &self.config.database,
                    search_string,
                )
                .await
                {
                    records.push(record);
                }
            }
        }

        info!(queries = queries.len(), records = records.len(), "feed crawl finished");
        Ok(records)
    }
}
