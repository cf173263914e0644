//! Paperscope crawler: browser driver seam, search-page traversal, source
//! crawlers, the ingest runner and CSV export.

pub mod crawlers;
pub mod driver;
pub mod error;
pub mod export;
pub mod orchestrator;
pub mod runner;

pub use crawlers::{Crawler, FeedCrawler, PageCrawler, RestCrawler, load_vocabulary};
pub use driver::{PageDriver, ResultRow, WaitCondition};
pub use error::{CrawlError, DriverError, DriverErrorKind, Result};
pub use export::write_papers_csv;
pub use orchestrator::{CrawlOrchestrator, CrawlSettings, CrawlState, ScrapedPaper};
pub use runner::{CrawlerRun, IngestReport, IngestRunner};

#[cfg(feature = "chromium")]
pub use driver::chromium::ChromiumDriver;
