//! HTTP/SSE transport.
//!
//! `GET /{endpoint}` (or `/{endpoint}/sse`) opens a session and streams its
//! queue as Server-Sent Events. `POST /{endpoint}/messages?session_id=…`
//! carries JSON-RPC envelopes; the HTTP reply is only an acknowledgment and
//! the RPC result is delivered on the stream.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::Stream;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::ServerConfig;
use crate::handlers;
use crate::protocol::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, SseMessage, ENDPOINT_EVENT, ERROR_EVENT,
    MESSAGE_EVENT,
};
use crate::session::{Frame, SessionId, SessionManager, SessionQueue};
use crate::tools::ToolRegistry;

/// Shared state behind every route.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub registry: Arc<ToolRegistry>,
    /// Route prefix without slashes; empty mounts at the root.
    pub endpoint: String,
    pub keepalive: Duration,
    /// Used for callback URLs when the request carries no host header.
    pub fallback_host: String,
}

impl AppState {
    pub fn new(config: &ServerConfig, registry: ToolRegistry) -> Self {
        Self {
            sessions: SessionManager::new(),
            registry: Arc::new(registry),
            endpoint: config.endpoint.clone(),
            keepalive: config.keepalive,
            fallback_host: config.bind_addr.to_string(),
        }
    }

    fn route(&self, suffix: &str) -> String {
        match (self.endpoint.is_empty(), suffix.is_empty()) {
            (true, true) => "/".to_string(),
            (true, false) => format!("/{suffix}"),
            (false, true) => format!("/{}", self.endpoint),
            (false, false) => format!("/{}/{suffix}", self.endpoint),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let mut app = Router::new();
    if !state.endpoint.is_empty() {
        app = app.route("/", get(index)).route(&state.route(""), get(open_stream));
    } else {
        app = app.route("/", get(open_stream));
    }
    app.route(&state.route("sse"), get(open_stream))
        .route(&state.route("messages"), post(post_message))
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, endpoint = %state.route(""), "listening");
    axum::serve(listener, router(state)).await
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(format!(
        "<h1>Endpoints:</h1><ul>\
         <li><b>{stream}</b> or <b>{sse}</b> - open an MCP event stream (web search and page processing)</li>\
         <li><b>{messages}</b> - POST JSON-RPC messages for a session</li></ul>",
        stream = state.route(""),
        sse = state.route("sse"),
        messages = state.route("messages"),
    ))
}

/// `{scheme}://{host}` from forwarding headers, else the request's own host.
fn base_url(headers: &HeaderMap, fallback_host: &str) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(',').next().unwrap_or(v).trim().to_string())
            .filter(|v| !v.is_empty())
    };
    let scheme = header("x-forwarded-proto").unwrap_or_else(|| "http".to_string());
    let host = header("x-forwarded-host")
        .or_else(|| header("host"))
        .unwrap_or_else(|| fallback_host.to_string());
    format!("{scheme}://{host}")
}

async fn open_stream(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut session = state.sessions.open();
    let callback = format!(
        "{}{}?session_id={}",
        base_url(&headers, &state.fallback_host),
        state.route("messages"),
        session.id()
    );
    let keepalive = state.keepalive;

    let stream = async_stream::stream! {
        yield Ok(to_event(SseMessage::new(ENDPOINT_EVENT, callback)));
        yield Ok(to_event(SseMessage::ping()));
        loop {
            match session.next_frame(keepalive).await {
                Frame::Message(message) => yield Ok(to_event(message)),
                Frame::Heartbeat => yield Ok(to_event(SseMessage::ping())),
                Frame::Closed => break,
            }
        }
    };

    Sse::new(stream)
}

fn to_event(message: SseMessage) -> Event {
    Event::default().event(message.event).data(message.data)
}

#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub session_id: String,
}

async fn post_message(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
    body: Bytes,
) -> Response {
    let session_id = SessionId::from(query.session_id.as_str());
    let Some(queue) = state.sessions.lookup(&session_id) else {
        tracing::warn!(session_id = %session_id, "message for unknown session");
        return (StatusCode::NOT_FOUND, Json(json!({ "detail": "Session not found" }))).into_response();
    };

    let value: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(session_id = %session_id, error = %e, "malformed JSON-RPC body");
            let response = JsonRpcResponse::error(None, JsonRpcError::parse_error());
            enqueue(&queue, ERROR_EVENT, &response);
            return (StatusCode::BAD_REQUEST, Json(response)).into_response();
        }
    };

    let req = match JsonRpcRequest::from_value(value) {
        Ok(r) => r,
        Err(invalid) => {
            tracing::warn!(session_id = %session_id, error = %invalid.error.message, "invalid JSON-RPC envelope");
            if !invalid.notification {
                enqueue(&queue, MESSAGE_EVENT, &JsonRpcResponse::error(invalid.id, invalid.error));
            }
            return acknowledged();
        }
    };

    tracing::debug!(session_id = %session_id, method = %req.method, "message received");

    // The task owns the queue, so the result is delivered even if this
    // request is dropped before it finishes.
    let registry = Arc::clone(&state.registry);
    let task = tokio::spawn(deliver(queue, registry, req));

    match task.await {
        Ok(Ok(())) => acknowledged(),
        Ok(Err(response)) => (StatusCode::INTERNAL_SERVER_ERROR, Json(response)).into_response(),
        Err(e) => {
            tracing::error!(session_id = %session_id, error = %e, "delivery task failed");
            let response = JsonRpcResponse::error(
                None,
                JsonRpcError::internal_error(format!("Internal error: {e}")),
            );
            (StatusCode::INTERNAL_SERVER_ERROR, Json(response)).into_response()
        }
    }
}

fn acknowledged() -> Response {
    (StatusCode::OK, Json(json!({ "status": "Message received and processed" }))).into_response()
}

/// Dispatch `req` and queue its response. A panic inside dispatch becomes a
/// -32603 `error` frame and is also returned for the HTTP reply.
async fn deliver(
    queue: SessionQueue,
    registry: Arc<ToolRegistry>,
    req: JsonRpcRequest,
) -> Result<(), JsonRpcResponse> {
    let method = req.method.clone();
    let request_id = req.id.clone();
    let dispatched = tokio::spawn(async move { handlers::dispatch(&req, &registry).await }).await;

    match dispatched {
        Ok(Some(response)) => {
            enqueue(&queue, MESSAGE_EVENT, &response);
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(e) => {
            let message = panic_message(e);
            tracing::error!(session_id = %queue.id(), method = %method, error = %message, "dispatch failed");
            let response = JsonRpcResponse::error(
                request_id,
                JsonRpcError::internal_error(format!("Internal error: {message}")),
            );
            enqueue(&queue, ERROR_EVENT, &response);
            Err(response)
        }
    }
}

/// Best-effort push; a session that closed meanwhile just drops the frame.
fn enqueue(queue: &SessionQueue, event: &str, response: &JsonRpcResponse) {
    match SseMessage::envelope(event, response) {
        Ok(message) => {
            if !queue.push(message) {
                tracing::debug!(session_id = %queue.id(), "session gone; response discarded");
            }
        }
        Err(e) => tracing::error!(session_id = %queue.id(), error = %e, "could not serialize response"),
    }
}

fn panic_message(err: tokio::task::JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked".to_string()
    }
}
