//! Paperscope core: paper records, storage session, upsert engine, configuration.

pub mod config;
pub mod error;
pub mod fault;
pub mod models;
pub mod storage;

pub use config::{AppConfig, FeedCrawlerConfig, LookupConfig, PageCrawlerConfig, PageLayout, RestCrawlerConfig, StorageConfig};
pub use error::{PaperscopeError, Result};
pub use fault::{FaultTolerantStep, Recovery};
pub use models::*;

pub use storage::database::{ConnectionPool, open_database, open_in_memory};
pub use storage::session::{EntityId, EntityKind, GetOrCreate, IngestSession, LinkKind, StorageSession};
pub use storage::upsert::{InsertOutcome, UpsertEngine};
