//! Typed failures for every collaborator boundary.
//!
//! Each layer returns its own error enum; the dispatcher decides whether a
//! failure becomes a JSON-RPC error envelope, and the aggregator decides
//! whether it degrades to an empty section.

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search query is empty")]
    EmptyQuery,
    #[error("search request failed: {0}")]
    Request(String),
    #[error("search provider returned HTTP {0}")]
    Status(u16),
    #[error("search response could not be decoded: {0}")]
    Decode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid URL '{0}': must start with http:// or https://")]
    InvalidUrl(String),
    #[error("fetching {url} failed: {message}")]
    Request { url: String, message: String },
    #[error("fetching {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("fetching {url} failed directly ({direct}) and through the proxy ({proxied})")]
    ProxyFallback {
        url: String,
        direct: String,
        proxied: String,
    },
    #[error("converting {url} to text failed: {message}")]
    Convert { url: String, message: String },
}

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("oracle request failed: {0}")]
    Request(String),
    #[error("oracle returned HTTP {0}")]
    Status(u16),
    #[error("oracle returned no content")]
    EmptyReply,
    #[error("oracle reply did not contain a START/END range: {0:?}")]
    Unparsable(String),
    #[error("oracle returned invalid line range {start}-{end} for content with {total} lines")]
    OutOfRange { start: usize, end: usize, total: usize },
}

/// Failure returned by a tool invocation.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Oracle(#[from] OracleError),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is not set")]
    Missing(&'static str),
    #[error("{0} must be a positive integer")]
    NotPositive(&'static str),
    #[error("{name} is not a valid socket address: {value}")]
    BadAddress { name: &'static str, value: String },
}
