use mcp_websearch_server::config::ServerConfig;
use mcp_websearch_server::fetch::http_client;
use mcp_websearch_server::server::{self, AppState};
use mcp_websearch_server::tools::default_registry;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mcp_websearch_server=info")),
        )
        .init();

    let config = match ServerConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("mcp-websearch-server: configuration error: {e}");
            std::process::exit(1);
        }
    };

    let client = match http_client() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("mcp-websearch-server: cannot build HTTP client: {e}");
            std::process::exit(1);
        }
    };

    let registry = match default_registry(&config, client) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("mcp-websearch-server: tool registration failed: {e}");
            std::process::exit(1);
        }
    };

    let names: Vec<&str> = registry.descriptors().into_iter().map(|d| d.name.as_str()).collect();
    tracing::info!(tools = ?names, "tool registry ready");

    let state = AppState::new(&config, registry);
    if let Err(e) = server::serve(config.bind_addr, state).await {
        eprintln!("mcp-websearch-server: fatal error: {e}");
        std::process::exit(1);
    }
}
