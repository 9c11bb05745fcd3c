//! Outbound HTTP collaborators: the search provider and page retrieval.

pub mod page;
pub mod search;

pub use page::{HttpPageFetcher, PageFetcher};
pub use search::{BraveSearch, SearchProvider, SearchResultItem};

/// Shared client for every outbound call.
pub fn http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("mcp-websearch-server/", env!("CARGO_PKG_VERSION")))
        .build()
}
