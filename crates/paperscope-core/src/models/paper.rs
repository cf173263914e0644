use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::search_string::SearchString;

/// Source-agnostic attribute set a `Paper` row is built from.
///
/// Optional fields that a source could not provide stay `None`; the
/// association lists are resolved to lookup entities at upsert time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalPaper {
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    #[serde(default, rename = "abstract", skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation_count: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Publication venue name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default)]
    pub authors: Vec<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Names of the research databases the paper was retrieved from.
    #[serde(default)]
    pub databases: Vec<String>,

    /// Sustainability goal tags. Ingestion leaves this empty for now.
    #[serde(default)]
    pub goals: Vec<String>,
}

impl CanonicalPaper {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        let database = database.into();
        if !self.databases.contains(&database) {
            self.databases.push(database);
        }
        self
    }
}

/// One unit handed to the upsert engine: a paper and the query that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestRecord {
    pub paper: CanonicalPaper,
    pub search_string: SearchString,
}

impl IngestRecord {
    pub fn new(paper: CanonicalPaper, search_string: SearchString) -> Self {
        Self {
            paper,
            search_string,
        }
    }
}
