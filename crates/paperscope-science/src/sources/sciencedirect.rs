use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::error::{Result, ScienceError};
use crate::http::RateLimitedClient;

/// Elsevier ScienceDirect search and article APIs.
///
/// Rate limiting is left to the caller: a 429 surfaces immediately as
/// [`ScienceError::RateLimit`] so that a page can be skipped.
pub struct ScienceDirectClient {
    client: RateLimitedClient,
    search_url: String,
    article_url: String,
    api_key: String,
}

/// One page of search hits.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub results_found: u32,
    pub results: Vec<Map<String, Value>>,
}

/// Fields pulled from the full-text article endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArticleDetails {
    pub tags: Vec<String>,
    pub pub_type: Option<String>,
    pub content_type: Option<String>,
    pub abstract_text: Option<String>,
    pub full_text: Option<String>,
}

impl ScienceDirectClient {
    pub fn with_params(
        search_url: &str,
        article_url: &str,
        api_key: &str,
        min_interval: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: RateLimitedClient::new(min_interval, 0, "paperscope/0.1")?,
            search_url: search_url.trim_end_matches('/').to_string(),
            article_url: article_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let key = HeaderValue::from_str(&self.api_key)
            .map_err(|_| ScienceError::MissingField("valid API key".to_string()))?;
        headers.insert("X-ELS-APIKey", key);
        Ok(headers)
    }

    pub async fn search(&self, qs: &str, date: &str, offset: u32, show: u32) -> Result<SearchPage> {
        let body = json!({
            "qs": qs,
            "date": date,
            "display": {
                "offset": offset,
                "show": show,
                "sortBy": "relevance",
            },
        });
        let val: Value = self
            .client
            .put_json_with_headers(&self.search_url, &body, self.headers()?)
            .await?;

        let results = val["results"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_object().cloned())
                    .collect()
            })
            .unwrap_or_default();

        Ok(SearchPage {
            results_found: results_found(&val),
            results,
        })
    }

    pub async fn article(&self, doi: &str) -> Result<Option<ArticleDetails>> {
        let url = format!("{}/{}", self.article_url, doi);
        let val: Value = match self.client.get_json_with_headers(&url, self.headers()?).await {
            Ok(val) => val,
            Err(ScienceError::ApiError(_, msg)) if msg.starts_with("HTTP 404") => return Ok(None),
            Err(e) => return Err(e),
        };

        let response = &val["full-text-retrieval-response"];
        if response.is_null() {
            return Ok(None);
        }
        Ok(Some(ArticleDetails::from_json(response)))
    }
}

impl ArticleDetails {
    pub fn from_json(response: &Value) -> Self {
        let core = &response["coredata"];

        let tags = core["dcterms:subject"]
            .as_array()
            .map(|subjects| {
                subjects
                    .iter()
                    .filter_map(|s| s["$"].as_str().or_else(|| s.as_str()))
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            tags,
            pub_type: core["pubType"].as_str().map(|s| s.trim().to_string()),
            content_type: core["prism:aggregationType"].as_str().map(|s| s.to_string()),
            abstract_text: core["dc:description"].as_str().and_then(clean_abstract),
            // Structured originalText payloads are not plain text.
            full_text: response["originalText"].as_str().map(|s| s.to_string()),
        }
    }
}

/// Saturates: paging is bounded by `truncate` anyway.
fn results_found(val: &Value) -> u32 {
    val["resultsFound"]
        .as_u64()
        .map_or(0, |n| u32::try_from(n).unwrap_or(u32::MAX))
}

fn clean_abstract(raw: &str) -> Option<String> {
    let cleaned: String = raw.replace("Abstract", "").trim().split('\n').collect();
    (!cleaned.is_empty()).then_some(cleaned)
}
