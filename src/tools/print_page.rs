use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ToolError;
use crate::fetch::PageFetcher;
use crate::protocol::PrintPageParams;
use crate::schema::string_params;

use super::{parse_arguments, Tool, ToolDescriptor};

pub const NAME: &str = "print_page";

/// `print_page(url)`: the page converted to readable text.
pub struct PrintPageTool {
    pages: Arc<dyn PageFetcher>,
}

impl PrintPageTool {
    pub fn new(pages: Arc<dyn PageFetcher>) -> Self {
        Self { pages }
    }
}

#[async_trait]
impl Tool for PrintPageTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: NAME.into(),
            description: "Fetches a web page and prints it as markdown-formatted text.".into(),
            input_schema: string_params(&[("url", "The URL of the web page to print.")]),
        }
    }

    async fn invoke(&self, arguments: Value) -> Result<String, ToolError> {
        let params: PrintPageParams = parse_arguments(arguments)?;
        self.pages.fetch(&params.url).await.map_err(|e| {
            tracing::error!(url = %params.url, error = %e, "could not fetch or convert page");
            e.into()
        })
    }
}
