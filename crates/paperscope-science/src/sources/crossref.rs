use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, ScienceError};
use crate::http::RateLimitedClient;
use crate::identifiers::doi::Doi;
use crate::sources::{BibliographicApi, WorkMetadata};

pub struct CrossRefSource {
    client: RateLimitedClient,
    base_url: String,
}

impl CrossRefSource {
    pub fn new(polite_email: Option<String>) -> Result<Self> {
        Self::with_params(
            "https://api.crossref.org",
            Duration::from_millis(100),
            polite_email,
        )
    }

    pub fn with_params(
        base_url: &str,
        min_interval: Duration,
        polite_email: Option<String>,
    ) -> Result<Self> {
        let user_agent = match &polite_email {
            Some(email) => format!("paperscope/0.1 (mailto:{email})"),
            None => "paperscope/0.1".to_string(),
        };

        Ok(Self {
            client: RateLimitedClient::new(min_interval, 3, &user_agent)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn fetch_by_doi(&self, doi: &Doi) -> Result<CrossRefWork> {
        let url = format!("{}/works/{}", self.base_url, doi.normalized);
        let val: Value = self.client.get_json(&url).await?;
        CrossRefWork::from_json(&val["message"])
    }

    /// Top hit of a free-text bibliographic query.
    pub async fn query_by_text(&self, text: &str) -> Result<Option<CrossRefWork>> {
        let url = format!(
            "{}/works?query.bibliographic={}&rows=1",
            self.base_url,
            urlencoding::encode(text)
        );
        let val: Value = self.client.get_json(&url).await?;

        match val["message"]["items"].as_array().and_then(|items| items.first()) {
            Some(item) => CrossRefWork::from_json(item).map(Some),
            None => Ok(None),
        }
    }
}

fn is_not_found(err: &ScienceError) -> bool {
    matches!(err, ScienceError::ApiError(_, msg) if msg.starts_with("HTTP 404"))
}

#[async_trait]
impl BibliographicApi for CrossRefSource {
    async fn lookup_by_identifier(&self, doi: &str) -> Result<Option<WorkMetadata>> {
        let doi = Doi::parse(doi)?;
        match self.fetch_by_doi(&doi).await {
            Ok(work) => Ok(Some(work.into_metadata())),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn lookup_by_title(&self, title: &str) -> Result<Option<WorkMetadata>> {
        Ok(self.query_by_text(title).await?.map(CrossRefWork::into_metadata))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossRefWork {
    pub doi: String,
    pub title: Vec<String>,
    pub author: Vec<String>,
    pub published_year: Option<i32>,
    pub container_title: Vec<String>,
    pub publisher: Option<String>,
    pub citation_count: Option<u32>,
}

fn string_list(v: &Value) -> Vec<String> {
    v.as_array()
        .map(|a| a.iter().filter_map(|v| v.as_str()).map(|s| s.to_string()).collect())
        .unwrap_or_default()
}

impl CrossRefWork {
    pub fn from_json(v: &Value) -> Result<Self> {
        let doi = v["DOI"]
            .as_str()
            .ok_or_else(|| ScienceError::Parse("Missing DOI in CrossRef response".to_string()))?
            .to_string();

        let author = v["author"]
            .as_array()
            .map(|a| a.iter().map(author_name).collect())
            .unwrap_or_default();

        Ok(Self {
            doi,
            title: string_list(&v["title"]),
            author,
            published_year: parse_year(v),
            container_title: string_list(&v["container-title"]),
            publisher: v["publisher"].as_str().map(|s| s.to_string()),
            citation_count: v["is-referenced-by-count"]
                .as_u64()
                .and_then(|n| u32::try_from(n).ok()),
        })
    }

    pub fn into_metadata(self) -> WorkMetadata {
        WorkMetadata {
            title: self.title.into_iter().next(),
            venue: self.container_title.into_iter().next(),
            doi: Some(self.doi),
            citation_count: self.citation_count,
        }
    }
}

fn author_name(v: &Value) -> String {
    match (v["given"].as_str(), v["family"].as_str()) {
        (Some(g), Some(f)) => format!("{g} {f}"),
        (None, Some(f)) => f.to_string(),
        (Some(g), None) => g.to_string(),
        (None, None) => v["name"].as_str().unwrap_or_default().to_string(),
    }
}

fn parse_year(v: &Value) -> Option<i32> {
    // CrossRef date parts: "published-print": {"date-parts": [[2017, 6, 12]]}
    v["published-print"]["date-parts"][0][0]
        .as_i64()
        .or_else(|| v["published-online"]["date-parts"][0][0].as_i64())
        .or_else(|| v["issued"]["date-parts"][0][0].as_i64())
        .map(|n| n as i32)
}
