//! Paperscope science: identifiers, metadata APIs, feed and REST sources,
//! record normalization and search string generation.

pub mod arxiv;
pub mod error;
pub mod http;
pub mod identifiers;
pub mod normalize;
pub mod search_strings;
pub mod sources;

pub use error::{Result, ScienceError};
pub use normalize::{RawRecord, RecordNormalizer, SourceKind};
pub use search_strings::{QuerySyntax, SearchStringGenerator, Vocabulary};
pub use sources::{BibliographicApi, WorkMetadata};
