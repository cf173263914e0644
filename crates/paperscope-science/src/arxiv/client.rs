use std::time::Duration;

use tracing::debug;

use crate::arxiv::parser::{FeedEntry, parse_atom_feed};
use crate::error::Result;
use crate::http::RateLimitedClient;

/// Client for an Atom query feed such as the arXiv export API.
pub struct FeedClient {
    client: RateLimitedClient,
    base_url: String,
}

impl FeedClient {
    pub fn new() -> Result<Self> {
        Self::with_params("http://export.arxiv.org/api/query", Duration::from_secs(3))
    }

    pub fn with_params(base_url: &str, min_interval: Duration) -> Result<Self> {
        Ok(Self {
            client: RateLimitedClient::new(min_interval, 3, "paperscope/0.1")?,
            base_url: base_url.to_string(),
        })
    }

    /// Query URL for an already rendered search string. Parentheses are
    /// percent-encoded; `+` separators are kept as they are.
    pub fn query_url(&self, query: &str, max_results: Option<u32>) -> String {
        let encoded = query.replace('(', "%28").replace(')', "%29");
        let sep = if self.base_url.contains('?') { '&' } else { '?' };
        let mut url = format!("{}{sep}search_query={encoded}", self.base_url);
        if let Some(n) = max_results {
            url.push_str(&format!("&max_results={n}"));
        }
        url
    }

    pub async fn search(&self, query: &str, max_results: Option<u32>) -> Result<Vec<FeedEntry>> {
        let url = self.query_url(query, max_results);
        debug!(%url, "querying feed");
        let xml = self.client.get(&url).await?;
        parse_atom_feed(&xml)
    }
}
