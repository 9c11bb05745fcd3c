use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::SearchError;

const SEARCH_TIMEOUT: Duration = Duration::from_secs(20);
/// Largest `count` the Brave web search API accepts.
pub const MAX_RESULT_COUNT: usize = 20;

/// One search hit, with provider-omitted fields filled by fixed fallbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResultItem {
    pub title: String,
    pub url: String,
    pub description: String,
}

/// A keyed web search API.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, count: usize) -> Result<Vec<SearchResultItem>, SearchError>;
}

/// Brave web search (`X-Subscription-Token` header, `q`/`count` query).
#[derive(Debug, Clone)]
pub struct BraveSearch {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl BraveSearch {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl SearchProvider for BraveSearch {
    async fn search(&self, query: &str, count: usize) -> Result<Vec<SearchResultItem>, SearchError> {
        if query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let wanted = count.clamp(1, MAX_RESULT_COUNT);
        let count = wanted.to_string();
        let resp = self
            .client
            .get(&self.endpoint)
            .timeout(SEARCH_TIMEOUT)
            .header(reqwest::header::ACCEPT, "application/json")
            .header("X-Subscription-Token", &self.api_key)
            .query(&[("q", query), ("count", count.as_str())])
            .send()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }

        let body: BraveResponse = resp
            .json()
            .await
            .map_err(|e| SearchError::Decode(e.to_string()))?;

        Ok(body
            .web
            .map(|web| web.results)
            .unwrap_or_default()
            .into_iter()
            .take(wanted)
            .map(SearchResultItem::from)
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct BraveResponse {
    #[serde(default)]
    web: Option<BraveWeb>,
}

#[derive(Debug, Deserialize)]
struct BraveWeb {
    #[serde(default)]
    results: Vec<BraveResult>,
}

#[derive(Debug, Deserialize)]
struct BraveResult {
    title: Option<String>,
    url: Option<String>,
    description: Option<String>,
}

impl From<BraveResult> for SearchResultItem {
    fn from(r: BraveResult) -> Self {
        Self {
            title: r.title.unwrap_or_else(|| "No Title".to_string()),
            url: r.url.unwrap_or_else(|| "#".to_string()),
            description: r.description.unwrap_or_else(|| "No Description".to_string()),
        }
    }
}
