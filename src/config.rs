use std::net::SocketAddr;
use std::time::Duration;

use crate::error::ConfigError;

/// Default heartbeat interval on idle streams (30 seconds).
const DEFAULT_KEEPALIVE_SECS: u64 = 30;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_ENDPOINT: &str = "websearch";
const DEFAULT_SEARCH_ENDPOINT: &str = "https://api.search.brave.com/res/v1/web/search";
const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_SEARCH_RESULT_COUNT: usize = 10;
const DEFAULT_AGGREGATE_RESULT_COUNT: usize = 4;

/// Credentials for the chat-completions model behind the content oracle.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Path prefix for the stream and message routes, without slashes.
    pub endpoint: String,
    pub keepalive: Duration,
    pub brave_api_key: String,
    pub search_endpoint: String,
    /// `None` disables the composite search-and-trim tool.
    pub llm: Option<LlmConfig>,
    pub page_proxy: Option<String>,
    pub search_result_count: usize,
    pub aggregate_result_count: usize,
}

impl ServerConfig {
    /// Load configuration from environment.
    ///
    /// - `BRAVE_API_KEY` (required): search provider subscription token
    /// - `BRAVE_SEARCH_ENDPOINT` (optional): search API override
    /// - `OPENAI_API_KEY` + `OPENAI_MODEL_NAME` (optional): enable the composite tool
    /// - `OPENAI_API_URL` (optional): chat-completions base URL
    /// - `PAGE_PROXY_URL` (optional): forwarding proxy for page retrieval
    /// - `MCP_BIND_ADDR` (optional, default 0.0.0.0:5000)
    /// - `MCP_ENDPOINT` (optional, default `websearch`)
    /// - `MCP_KEEPALIVE_SECS` (optional, default 30)
    /// - `SEARCH_RESULT_COUNT` (optional, default 10)
    /// - `AGGREGATE_RESULT_COUNT` (optional, default 4)
    pub fn from_env() -> Result<Self, ConfigError> {
        let brave_api_key = env("BRAVE_API_KEY").ok_or(ConfigError::Missing("BRAVE_API_KEY"))?;

        let bind_raw = env("MCP_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError::BadAddress {
            name: "MCP_BIND_ADDR",
            value: bind_raw.clone(),
        })?;

        let llm = match (env("OPENAI_API_KEY"), env("OPENAI_MODEL_NAME")) {
            (Some(api_key), Some(model)) => Some(LlmConfig {
                api_key,
                base_url: env("OPENAI_API_URL").unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
                model,
            }),
            _ => None,
        };

        Ok(Self {
            bind_addr,
            endpoint: normalize_endpoint(
                &env("MCP_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            ),
            keepalive: Duration::from_secs(positive("MCP_KEEPALIVE_SECS", DEFAULT_KEEPALIVE_SECS)?),
            brave_api_key,
            search_endpoint: env("BRAVE_SEARCH_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_SEARCH_ENDPOINT.to_string()),
            llm,
            page_proxy: env("PAGE_PROXY_URL"),
            search_result_count: positive("SEARCH_RESULT_COUNT", DEFAULT_SEARCH_RESULT_COUNT as u64)?
                as usize,
            aggregate_result_count: positive(
                "AGGREGATE_RESULT_COUNT",
                DEFAULT_AGGREGATE_RESULT_COUNT as u64,
            )? as usize,
        })
    }
}

/// Strip surrounding slashes so route and callback URLs can be built with a
/// single separator.
pub fn normalize_endpoint(raw: &str) -> String {
    raw.trim().trim_matches('/').to_string()
}

fn env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn positive(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env(key) {
        Some(val) => match val.parse::<u64>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(ConfigError::NotPositive(key)),
        },
        None => Ok(default),
    }
}
