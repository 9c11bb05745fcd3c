//! MCP web-search server.
//!
//! Exposes `search_web`, `print_page` and `search_and_print_page` tools over
//! JSON-RPC 2.0 on a Server-Sent-Events transport: each client holds a
//! long-lived event stream and POSTs requests to a per-session callback URL.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod fetch;
pub mod handlers;
pub mod oracle;
pub mod protocol;
pub mod schema;
pub mod server;
pub mod session;
pub mod tools;
