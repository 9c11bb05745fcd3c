//! In-process fakes for the search provider, page fetcher and chat model.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mcp_websearch_server::error::{FetchError, OracleError, SearchError};
use mcp_websearch_server::fetch::{PageFetcher, SearchProvider, SearchResultItem};
use mcp_websearch_server::oracle::{ChatModel, ContentOracle};
use mcp_websearch_server::tools::{PrintPageTool, SearchAndPrintPageTool, SearchWebTool, ToolRegistry};

pub fn item(n: usize) -> SearchResultItem {
    SearchResultItem {
        title: format!("Page {n}"),
        url: format!("https://site{n}.example/"),
        description: format!("Description {n}"),
    }
}

pub struct FakeSearch {
    pub results: Vec<SearchResultItem>,
    pub fail: bool,
}

impl FakeSearch {
    pub fn with(results: Vec<SearchResultItem>) -> Arc<Self> {
        Arc::new(Self { results, fail: false })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            results: Vec::new(),
            fail: true,
        })
    }
}

#[async_trait]
impl SearchProvider for FakeSearch {
    async fn search(&self, query: &str, count: usize) -> Result<Vec<SearchResultItem>, SearchError> {
        if query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        if self.fail {
            return Err(SearchError::Status(503));
        }
        Ok(self.results.iter().take(count).cloned().collect())
    }
}

/// Serves canned pages, each after its own delay. Unknown URLs fail.
#[derive(Default)]
pub struct FakePages {
    pages: HashMap<String, (Duration, String)>,
}

impl FakePages {
    pub fn page(mut self, url: &str, delay_ms: u64, body: &str) -> Self {
        self.pages
            .insert(url.to_string(), (Duration::from_millis(delay_ms), body.to_string()));
        self
    }
}

#[async_trait]
impl PageFetcher for FakePages {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        match self.pages.get(url) {
            Some((delay, body)) => {
                tokio::time::sleep(*delay).await;
                Ok(body.clone())
            }
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 502,
            }),
        }
    }
}

/// Always answers with the same range.
pub struct FixedReply(pub &'static str);

#[async_trait]
impl ChatModel for FixedReply {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String, OracleError> {
        Ok(self.0.to_string())
    }
}

/// Answers `START: 1, END: 1` unless the prompt contains `marker`.
pub struct RejectMarker(pub &'static str);

#[async_trait]
impl ChatModel for RejectMarker {
    async fn complete(&self, _system: &str, user: &str) -> Result<String, OracleError> {
        if user.contains(self.0) {
            Ok("I could not decide".to_string())
        } else {
            Ok("START: 1, END: 1".to_string())
        }
    }
}

pub fn registry(
    search: Arc<dyn SearchProvider>,
    pages: Arc<dyn PageFetcher>,
    model: Arc<dyn ChatModel>,
    count: usize,
) -> ToolRegistry {
    ToolRegistry::new()
        .with(Arc::new(SearchWebTool::new(Arc::clone(&search), 10)))
        .unwrap()
        .with(Arc::new(PrintPageTool::new(Arc::clone(&pages))))
        .unwrap()
        .with(Arc::new(SearchAndPrintPageTool::new(
            search,
            pages,
            ContentOracle::new(model),
            count,
        )))
        .unwrap()
}
