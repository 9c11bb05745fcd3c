//! Tool registry and the tools it serves.
//!
//! Tools implement [`Tool`]; the registry owns the descriptors, validates
//! call arguments against each tool's input schema and only then invokes it.
//! The registry is built once at startup and shared immutably afterwards.

pub mod print_page;
pub mod search_and_print_page;
pub mod search_web;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::config::ServerConfig;
use crate::error::ToolError;
use crate::fetch::{BraveSearch, HttpPageFetcher, PageFetcher, SearchProvider};
use crate::oracle::{ContentOracle, OpenAiChat};
use crate::schema::{ArgumentSchema, SchemaValidationError};

pub use print_page::PrintPageTool;
pub use search_and_print_page::SearchAndPrintPageTool;
pub use search_web::SearchWebTool;

/// Name, description and input schema as advertised by `tools/list`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn descriptor(&self) -> ToolDescriptor;

    /// Run the tool. `arguments` has already passed schema validation.
    async fn invoke(&self, arguments: Value) -> Result<String, ToolError>;
}

/// Deserialize validated arguments into a tool's typed parameters.
pub(crate) fn parse_arguments<T: serde::de::DeserializeOwned>(arguments: Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("tool '{0}' is already registered")]
    Duplicate(String),
    #[error("tool '{name}' has an invalid input schema: {source}")]
    InvalidSchema {
        name: String,
        source: SchemaValidationError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum CallError {
    #[error("Tool '{0}' not found")]
    NotFound(String),
    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },
    #[error("Internal error during tool execution: {0}")]
    Failed(#[from] ToolError),
}

struct Entry {
    descriptor: ToolDescriptor,
    schema: ArgumentSchema,
    tool: Arc<dyn Tool>,
}

/// Ordered, name-unique collection of tools.
#[derive(Default)]
pub struct ToolRegistry {
    entries: Vec<Entry>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), RegistryError> {
        let descriptor = tool.descriptor();
        if self.lookup(&descriptor.name).is_some() {
            return Err(RegistryError::Duplicate(descriptor.name));
        }
        let schema = ArgumentSchema::compile(&descriptor.input_schema).map_err(|source| {
            RegistryError::InvalidSchema {
                name: descriptor.name.clone(),
                source,
            }
        })?;
        self.entries.push(Entry { descriptor, schema, tool });
        Ok(())
    }

    pub fn with(mut self, tool: Arc<dyn Tool>) -> Result<Self, RegistryError> {
        self.register(tool)?;
        Ok(self)
    }

    pub fn lookup(&self, name: &str) -> Option<&ToolDescriptor> {
        self.entry(name).map(|e| &e.descriptor)
    }

    /// Descriptors in registration order.
    pub fn descriptors(&self) -> Vec<&ToolDescriptor> {
        self.entries.iter().map(|e| &e.descriptor).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validate `arguments` (absent means `{}`) and invoke the named tool.
    pub async fn call(&self, name: &str, arguments: Option<Value>) -> Result<String, CallError> {
        let entry = self.entry(name).ok_or_else(|| CallError::NotFound(name.to_string()))?;
        let arguments = match arguments {
            None | Some(Value::Null) => Value::Object(serde_json::Map::new()),
            Some(v) => v,
        };

        entry
            .schema
            .validate(&arguments)
            .map_err(|e| CallError::InvalidArguments {
                tool: name.to_string(),
                message: e.to_string(),
            })?;

        Ok(entry.tool.invoke(arguments).await?)
    }

    fn entry(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.descriptor.name == name)
    }
}

/// Build the production registry from configuration.
///
/// The composite tool is only registered when oracle credentials are set.
pub fn default_registry(config: &ServerConfig, client: reqwest::Client) -> Result<ToolRegistry, RegistryError> {
    let search: Arc<dyn SearchProvider> = Arc::new(BraveSearch::new(
        client.clone(),
        config.brave_api_key.clone(),
        config.search_endpoint.clone(),
    ));
    let pages: Arc<dyn PageFetcher> = Arc::new(HttpPageFetcher::new(client.clone(), config.page_proxy.clone()));

    let mut registry = ToolRegistry::new()
        .with(Arc::new(SearchWebTool::new(Arc::clone(&search), config.search_result_count)))?
        .with(Arc::new(PrintPageTool::new(Arc::clone(&pages))))?;

    match &config.llm {
        Some(llm) => {
            let oracle = ContentOracle::new(Arc::new(OpenAiChat::new(client, llm.clone())));
            registry.register(Arc::new(SearchAndPrintPageTool::new(
                search,
                pages,
                oracle,
                config.aggregate_result_count,
            )))?;
        }
        None => tracing::warn!(
            "OPENAI_API_KEY / OPENAI_MODEL_NAME not set; search_and_print_page is disabled"
        ),
    }

    Ok(registry)
}
