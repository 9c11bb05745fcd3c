use serde_json::json;

use crate::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, ToolCallParams, ToolResult};
use crate::tools::{CallError, ToolRegistry};

pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Dispatch a JSON-RPC request to the appropriate handler.
///
/// Returns `None` for notifications (no response required), including
/// notifications whose handling failed.
pub async fn dispatch(req: &JsonRpcRequest, registry: &ToolRegistry) -> Option<JsonRpcResponse> {
    let response = respond(req, registry).await;
    if req.is_notification() {
        if let Some(JsonRpcResponse { error: Some(err), .. }) = &response {
            tracing::debug!(method = %req.method, error = %err.message, "notification failed");
        }
        return None;
    }
    response
}

async fn respond(req: &JsonRpcRequest, registry: &ToolRegistry) -> Option<JsonRpcResponse> {
    if let Some(version) = &req.jsonrpc {
        if version != "2.0" {
            return Some(JsonRpcResponse::error(
                req.id.clone(),
                JsonRpcError::invalid_request_with(format!("Unsupported jsonrpc version: {version}")),
            ));
        }
    }

    match req.method.as_str() {
        "initialize" => {
            let result = json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": { "listTools": true, "callTool": true },
                    "resources": {}
                },
                "serverInfo": {
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION")
                }
            });
            Some(JsonRpcResponse::success(req.id.clone(), result))
        }

        method if method.starts_with("notifications/") => None,

        "ping" => Some(JsonRpcResponse::success(req.id.clone(), json!({}))),

        "tools/list" => {
            let result = json!({ "tools": registry.descriptors() });
            Some(JsonRpcResponse::success(req.id.clone(), result))
        }

        "tools/call" => Some(tools_call(req, registry).await),

        "resources/list" => Some(JsonRpcResponse::success(req.id.clone(), json!({ "resources": [] }))),

        "resources/templates/list" => Some(JsonRpcResponse::success(
            req.id.clone(),
            json!({ "resourceTemplates": [] }),
        )),

        _ => Some(JsonRpcResponse::error(
            req.id.clone(),
            JsonRpcError::method_not_found(&req.method),
        )),
    }
}

async fn tools_call(req: &JsonRpcRequest, registry: &ToolRegistry) -> JsonRpcResponse {
    let params: ToolCallParams = match &req.params {
        Some(v) => match serde_json::from_value(v.clone()) {
            Ok(p) => p,
            Err(e) => {
                return JsonRpcResponse::error(
                    req.id.clone(),
                    JsonRpcError::invalid_params(format!("Invalid tools/call params: {e}")),
                );
            }
        },
        None => {
            return JsonRpcResponse::error(
                req.id.clone(),
                JsonRpcError::invalid_params("Missing params for tools/call"),
            );
        }
    };

    tracing::info!(tool = %params.name, "tool call");
    match registry.call(&params.name, params.arguments).await {
        Ok(text) => match serde_json::to_value(ToolResult::text(text)) {
            Ok(result) => JsonRpcResponse::success(req.id.clone(), result),
            Err(e) => JsonRpcResponse::error(req.id.clone(), JsonRpcError::internal_error(e.to_string())),
        },
        Err(err) => {
            let error = match &err {
                CallError::NotFound(name) => {
                    tracing::warn!(tool = %name, "unknown tool");
                    JsonRpcError::tool_not_found(name)
                }
                CallError::InvalidArguments { tool, message } => {
                    tracing::warn!(tool = %tool, error = %message, "invalid tool arguments");
                    JsonRpcError::invalid_params(err.to_string())
                }
                CallError::Failed(source) => {
                    tracing::error!(tool = %params.name, error = %source, "tool failed");
                    JsonRpcError::internal_error(err.to_string())
                }
            };
            JsonRpcResponse::error(req.id.clone(), error)
        }
    }
}
