//! Runs crawlers against one storage session and reports what was inserted.

use std::time::{Duration, Instant};

use paperscope_core::{IngestRecord, StorageSession, UpsertEngine};
use tracing::{Instrument, info, info_span, warn};

use crate::crawlers::Crawler;
use crate::error::Result;
use crate::export::write_papers_csv;

/// Outcome of one crawler within a run.
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlerRun {
    pub name: String,
    pub retrieved: usize,
    pub inserted: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    pub inserted: usize,
    /// Titles that were already stored.
    pub duplicates: Vec<String>,
    pub per_crawler: Vec<CrawlerRun>,
}

pub struct IngestRunner {
    engine: UpsertEngine,
}

impl IngestRunner {
    pub fn new(batch_size: usize) -> Self {
        Self {
            engine: UpsertEngine::new(batch_size),
        }
    }

    /// Run every crawler in order. A crawler that fails is logged and
    /// skipped; a storage failure rolls the session back and ends the run.
    pub async fn run<S>(
        &mut self,
        session: &mut S,
        crawlers: &mut [Box<dyn Crawler>],
    ) -> Result<IngestReport>
    where
        S: StorageSession + ?Sized,
    {
        let mut report = IngestReport::default();

        for crawler in crawlers.iter_mut() {
            let span = info_span!("crawler", name = crawler.name(), database = crawler.database());
            let run = self
                .run_one(session, crawler.as_mut(), &mut report.duplicates)
                .instrument(span)
                .await?;
            report.inserted += run.inserted;
            report.per_crawler.push(run);
        }

        info!(
            inserted = report.inserted,
            duplicates = report.duplicates.len(),
            "{} rows were actually inserted",
            report.inserted
        );
        if !report.duplicates.is_empty() {
            info!(titles = ?report.duplicates, "duplicate papers");
        }
        Ok(report)
    }

    async fn run_one<S>(
        &mut self,
        session: &mut S,
        crawler: &mut dyn Crawler,
        duplicates: &mut Vec<String>,
    ) -> Result<CrawlerRun>
    where
        S: StorageSession + ?Sized,
    {
        let start = Instant::now();
        info!("crawler started");

        let existing = session.search_string_names()?;
        let records = match crawler.crawl(&existing).await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "crawler failed");
                Vec::new()
            }
        };
        crawler.close().await;

        let inserted = match self.store(session, &records, duplicates) {
            Ok(inserted) => inserted,
            Err(e) => {
                if let Err(rollback) = session.rollback() {
                    warn!(error = %rollback, "rollback failed");
                }
                return Err(e);
            }
        };

        if let Some(dir) = crawler.export_dir()
            && let Err(e) = write_papers_csv(dir, crawler.database(), &records)
        {
            warn!(error = %e, "export failed");
        }

        let elapsed = start.elapsed();
        info!(
            retrieved = records.len(),
            inserted,
            elapsed_ms = elapsed.as_millis() as u64,
            "crawler finished"
        );
        Ok(CrawlerRun {
            name: crawler.name().to_string(),
            retrieved: records.len(),
            inserted,
            elapsed,
        })
    }

    fn store<S>(
        &mut self,
        session: &mut S,
        records: &[IngestRecord],
        duplicates: &mut Vec<String>,
    ) -> Result<usize>
    where
        S: StorageSession + ?Sized,
    {
        let mut inserted = 0;
        for record in records {
            let outcome = self.engine.insert(session, record)?;
            if outcome.inserted {
                inserted += 1;
            }
            if let Some(title) = outcome.duplicate {
                duplicates.push(title);
            }
        }
        session.commit()?;
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use paperscope_core::{
        CanonicalPaper, EntityKind, IngestSession, SearchString, open_in_memory,
    };
    use tempfile::TempDir;

    use super::*;
    use crate::error::{CrawlError, DriverError};

    struct StubCrawler {
        name: &'static str,
        records: Vec<IngestRecord>,
        fail: bool,
        export_dir: Option<PathBuf>,
        seen_existing: Arc<Mutex<Vec<HashSet<String>>>>,
    }

    impl StubCrawler {
        fn new(name: &'static str, records: Vec<IngestRecord>) -> Self {
            Self {
                name,
                records,
                fail: false,
                export_dir: None,
                seen_existing: Arc::default(),
            }
        }
    }

    #[async_trait]
    impl Crawler for StubCrawler {
        fn name(&self) -> &str {
            self.name
        }

        fn database(&self) -> &str {
            "stub"
        }

        fn export_dir(&self) -> Option<&Path> {
            self.export_dir.as_deref()
        }

        async fn crawl(&mut self, existing: &HashSet<String>) -> Result<Vec<IngestRecord>> {
            self.seen_existing.lock().unwrap().push(existing.clone());
            if self.fail {
                return Err(CrawlError::Driver(DriverError::timeout("primary_paper")));
            }
            Ok(self.records.clone())
        }
    }

    fn record(title: &str, query: &str) -> IngestRecord {
        IngestRecord::new(
            CanonicalPaper::new(title).with_database("stub"),
            SearchString::new(query),
        )
    }

    #[tokio::test]
    async fn aggregates_inserts_and_duplicates_across_crawlers() {
        let pool = open_in_memory().unwrap();
        let mut session = IngestSession::new(pool.get_connection());

        let second = StubCrawler::new(
            "second",
            vec![record("Soil carbon", "q2"), record("Peatland credits", "q2")],
        );
        let seen = second.seen_existing.clone();
        let mut crawlers: Vec<Box<dyn Crawler>> = vec![
            Box::new(StubCrawler::new(
                "first",
                vec![record("Soil carbon", "q1"), record("Forest offsets", "q1")],
            )),
            Box::new(second),
        ];

        let report = IngestRunner::new(100)
            .run(&mut session, &mut crawlers)
            .await
            .unwrap();

        assert_eq!(report.inserted, 3);
        assert_eq!(report.duplicates, vec!["Soil carbon"]);
        assert_eq!(
            report.per_crawler.iter().map(|r| (r.name.as_str(), r.inserted)).collect::<Vec<_>>(),
            vec![("first", 2), ("second", 1)]
        );
        assert!(seen.lock().unwrap()[0].contains("q1"));
        assert_eq!(session.count(EntityKind::Paper).unwrap(), 3);
        assert_eq!(session.count(EntityKind::SearchString).unwrap(), 2);
    }

    #[tokio::test]
    async fn failing_crawler_does_not_stop_the_run() {
        let pool = open_in_memory().unwrap();
        let mut session = IngestSession::new(pool.get_connection());

        let mut broken = StubCrawler::new("broken", Vec::new());
        broken.fail = true;
        let mut crawlers: Vec<Box<dyn Crawler>> = vec![
            Box::new(broken),
            Box::new(StubCrawler::new("ok", vec![record("Forest offsets", "q")])),
        ];

        let report = IngestRunner::new(100)
            .run(&mut session, &mut crawlers)
            .await
            .unwrap();

        assert_eq!(report.inserted, 1);
        assert_eq!(report.per_crawler[0].retrieved, 0);
        assert_eq!(report.per_crawler[1].inserted, 1);
    }

    #[tokio::test]
    async fn exports_when_directory_is_configured() {
        let dir = TempDir::new().unwrap();
        let pool = open_in_memory().unwrap();
        let mut session = IngestSession::new(pool.get_connection());

        let mut crawler = StubCrawler::new("feed", vec![record("Soil carbon", "q")]);
        crawler.export_dir = Some(dir.path().to_path_buf());
        let mut crawlers: Vec<Box<dyn Crawler>> = vec![Box::new(crawler)];

        IngestRunner::new(100)
            .run(&mut session, &mut crawlers)
            .await
            .unwrap();

        assert!(dir.path().join("stub").join("papers.csv").exists());
    }
}
