use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ToolError;
use crate::fetch::{SearchProvider, SearchResultItem};
use crate::protocol::SearchWebParams;
use crate::schema::string_params;

use super::{parse_arguments, Tool, ToolDescriptor};

pub const NAME: &str = "search_web";

/// `search_web(query)`: a markdown bullet list of search hits.
pub struct SearchWebTool {
    search: Arc<dyn SearchProvider>,
    count: usize,
}

impl SearchWebTool {
    pub fn new(search: Arc<dyn SearchProvider>, count: usize) -> Self {
        Self { search, count }
    }
}

#[async_trait]
impl Tool for SearchWebTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: NAME.into(),
            description: "Searches the web using Brave Search and returns search results.".into(),
            input_schema: string_params(&[("query", "The search query.")]),
        }
    }

    async fn invoke(&self, arguments: Value) -> Result<String, ToolError> {
        let params: SearchWebParams = parse_arguments(arguments)?;
        let results = self.search.search(&params.query, self.count).await?;
        if results.is_empty() {
            tracing::info!(query = %params.query, "search returned no results");
        }
        Ok(render(&results))
    }
}

fn render(results: &[SearchResultItem]) -> String {
    let mut out = String::from("## Search Results:\n\n");
    for r in results {
        out.push_str(&format!("- **[{}]({})**\n  {}\n\n", r.title, r.url, r.description));
    }
    out.trim().to_string()
}
