use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use paperscope_core::{IngestRecord, PageCrawlerConfig};
use paperscope_science::{QuerySyntax, RecordNormalizer, SearchStringGenerator, SourceKind, Vocabulary};
use rand::rngs::StdRng;
use tracing::info;

use super::{Crawler, to_record};
use crate::driver::PageDriver;
use crate::error::Result;
use crate::orchestrator::{CrawlOrchestrator, CrawlSettings};

/// Search-engine UI crawler driving two browser contexts.
pub struct PageCrawler<L, D> {
    database: String,
    max_queries: usize,
    export_dir: Option<PathBuf>,
    orchestrator: CrawlOrchestrator<L, D>,
    generator: SearchStringGenerator<StdRng>,
    normalizer: Arc<RecordNormalizer>,
}

impl<L: PageDriver, D: PageDriver> PageCrawler<L, D> {
    pub fn new(
        config: &PageCrawlerConfig,
        list: L,
        detail: D,
        vocabulary: Vocabulary,
        normalizer: Arc<RecordNormalizer>,
    ) -> Self {
        let generator = SearchStringGenerator::new(vocabulary, QuerySyntax::Plain);
        Self::with_generator(config, list, detail, generator, normalizer)
    }

    pub fn with_generator(
        config: &PageCrawlerConfig,
        list: L,
        detail: D,
        generator: SearchStringGenerator<StdRng>,
        normalizer: Arc<RecordNormalizer>,
    ) -> Self {
        let generator = generator
            .with_max_terms(config.nb_keywords)
            .with_pub_year_filter(config.pub_year_filter.map(|y| y.to_string()));
        Self {
            database: config.database.clone(),
            max_queries: config.max_queries,
            export_dir: config.export_dir.as_ref().map(PathBuf::from),
            orchestrator: CrawlOrchestrator::new(
                list,
                detail,
                config.layout.clone(),
                CrawlSettings::from(config),
            ),
            generator,
            normalizer,
        }
    }
}

#[async_trait]
impl<L: PageDriver, D: PageDriver> Crawler for PageCrawler<L, D> {
    fn name(&self) -> &str {
        "page"
    }

    fn database(&self) -> &str {
        &self.database
    }

    fn export_dir(&self) -> Option<&Path> {
        self.export_dir.as_deref()
    }

    async fn crawl(&mut self, existing: &HashSet<String>) -> Result<Vec<IngestRecord>> {
        let queries = self.generator.generate_distinct(self.max_queries, existing);
        let mut records = Vec::new();

        for search_string in &queries {
            let scraped = self.orchestrator.crawl_query(&search_string.name).await;
            for paper in &scraped {
                if let Some(record) = to_record(
                    &self.normalizer,
                    &paper.raw,
                    SourceKind::Page,
                    &self.database,
                    search_string,
                )
                .await
                {
                    records.push(record);
                }
            }
        }

        info!(queries = queries.len(), records = records.len(), "page crawl finished");
        Ok(records)
    }

    async fn close(&mut self) {
        self.orchestrator.shutdown().await;
    }
}
