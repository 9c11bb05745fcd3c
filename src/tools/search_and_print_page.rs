use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::aggregate::map_ordered;
use crate::error::ToolError;
use crate::fetch::{PageFetcher, SearchProvider, SearchResultItem};
use crate::oracle::ContentOracle;
use crate::protocol::SearchAndPrintPageParams;
use crate::schema::string_params;

use super::{parse_arguments, Tool, ToolDescriptor};

pub const NAME: &str = "search_and_print_page";

const SEPARATOR: &str = "################";

/// `search_and_print_page(query, context)`: search, then fetch and trim every
/// hit concurrently, one section per hit in search-result order.
pub struct SearchAndPrintPageTool {
    search: Arc<dyn SearchProvider>,
    pages: Arc<dyn PageFetcher>,
    oracle: ContentOracle,
    count: usize,
}

impl SearchAndPrintPageTool {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        pages: Arc<dyn PageFetcher>,
        oracle: ContentOracle,
        count: usize,
    ) -> Self {
        Self {
            search,
            pages,
            oracle,
            count,
        }
    }
}

#[async_trait]
impl Tool for SearchAndPrintPageTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: NAME.into(),
            description: "Searches the web, fetches the result pages, trims each page to the part \
                          relevant to the context and returns the formatted excerpts."
                .into(),
            input_schema: string_params(&[
                ("query", "The search query."),
                (
                    "context",
                    "Context for trimming page content. Must be very descriptive; only parts matching it are returned.",
                ),
            ]),
        }
    }

    async fn invoke(&self, arguments: Value) -> Result<String, ToolError> {
        let params: SearchAndPrintPageParams = parse_arguments(arguments)?;
        let results = self.search.search(&params.query, self.count).await?;
        let relevance = format!("{}: {}", params.query, params.context);

        let pages = Arc::clone(&self.pages);
        let oracle = self.oracle.clone();
        let excerpts = map_ordered(results.clone(), move |item| {
            let pages = Arc::clone(&pages);
            let oracle = oracle.clone();
            let relevance = relevance.clone();
            async move { excerpt_for(&item, pages.as_ref(), &oracle, &relevance).await }
        })
        .await;

        let body: String = results
            .iter()
            .zip(excerpts)
            .map(|(item, excerpt)| section(item, excerpt.as_deref().unwrap_or("")))
            .collect();
        Ok(body.trim_end().to_string())
    }
}

/// Fetch and trim one hit; any failure degrades to an empty excerpt.
async fn excerpt_for(
    item: &SearchResultItem,
    pages: &dyn PageFetcher,
    oracle: &ContentOracle,
    relevance: &str,
) -> String {
    let page = match pages.fetch(&item.url).await {
        Ok(page) => page,
        Err(e) => {
            tracing::warn!(url = %item.url, error = %e, "page fetch failed; leaving section empty");
            return String::new();
        }
    };

    match oracle.trim(relevance, &page).await {
        Ok(excerpt) => excerpt,
        Err(e) => {
            tracing::warn!(url = %item.url, error = %e, "trim failed; leaving section empty");
            String::new()
        }
    }
}

fn section(item: &SearchResultItem, excerpt: &str) -> String {
    format!("# {}\n[{}]\n\n{}\n\n{}\n\n", item.title, item.url, excerpt, SEPARATOR)
}
