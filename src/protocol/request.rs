use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::response::JsonRpcError;

/// JSON-RPC 2.0 ID: a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcId {
    Number(i64),
    Str(String),
}

/// JSON-RPC 2.0 request envelope.
///
/// `jsonrpc` is optional on the wire; clients speaking the SSE transport
/// frequently omit it. An absent or null `id` marks a notification.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<RpcId>,
    pub method: String,
    #[serde(default)]
    pub params: Option<serde_json::Value>,
}

impl JsonRpcRequest {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Read an envelope out of a body that is already known to be JSON.
    ///
    /// Field types are checked one by one so a readable `id` survives a bad
    /// `method`. A non-string `jsonrpc` is kept as its JSON text and later
    /// fails the version check.
    pub fn from_value(value: Value) -> Result<Self, InvalidEnvelope> {
        let Value::Object(mut fields) = value else {
            return Err(InvalidEnvelope {
                id: None,
                notification: false,
                error: JsonRpcError::invalid_request_with("Invalid Request: envelope must be a JSON object"),
            });
        };

        let id = match fields.remove("id") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(RpcId::Str(s)),
            Some(Value::Number(n)) if n.is_i64() => n.as_i64().map(RpcId::Number),
            Some(other) => {
                return Err(InvalidEnvelope {
                    id: None,
                    notification: false,
                    error: JsonRpcError::invalid_request_with(format!(
                        "Invalid Request: id must be a string or an integer, got {other}"
                    )),
                });
            }
        };

        let method = match fields.remove("method") {
            Some(Value::String(m)) => m,
            other => {
                let detail = match other {
                    None => "Invalid Request: missing method".to_string(),
                    Some(v) => format!("Invalid Request: method must be a string, got {v}"),
                };
                return Err(InvalidEnvelope {
                    notification: id.is_none(),
                    id,
                    error: JsonRpcError::invalid_request_with(detail),
                });
            }
        };

        let jsonrpc = match fields.remove("jsonrpc") {
            None | Some(Value::Null) => None,
            Some(Value::String(v)) => Some(v),
            Some(other) => Some(other.to_string()),
        };

        let params = match fields.remove("params") {
            None | Some(Value::Null) => None,
            Some(v) => Some(v),
        };

        Ok(Self { jsonrpc, id, method, params })
    }
}

/// Valid JSON that is not a usable request envelope.
#[derive(Debug, Clone)]
pub struct InvalidEnvelope {
    pub id: Option<RpcId>,
    /// An object without an `id` is a notification and gets no reply.
    pub notification: bool,
    pub error: JsonRpcError,
}

/// Parameters for `tools/call`.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    pub arguments: Option<serde_json::Value>,
}

/// Arguments for the `search_web` tool.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchWebParams {
    pub query: String,
}

/// Arguments for the `print_page` tool.
#[derive(Debug, Clone, Deserialize)]
pub struct PrintPageParams {
    pub url: String,
}

/// Arguments for the `search_and_print_page` tool.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchAndPrintPageParams {
    pub query: String,
    pub context: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn full_envelope_is_read() {
        let req = JsonRpcRequest::from_value(json!({
            "jsonrpc": "2.0", "id": "abc", "method": "tools/list", "params": { "x": 1 }
        }))
        .unwrap();
        assert_eq!(req.id, Some(RpcId::Str("abc".into())));
        assert_eq!(req.method, "tools/list");
        assert_eq!(req.params, Some(json!({ "x": 1 })));
    }

    #[test]
    fn missing_method_keeps_the_id() {
        let err = JsonRpcRequest::from_value(json!({ "jsonrpc": "2.0", "id": 7 })).unwrap_err();
        assert_eq!(err.id, Some(RpcId::Number(7)));
        assert!(!err.notification);
        assert_eq!(err.error.code, JsonRpcError::INVALID_REQUEST);
    }

    #[test]
    fn missing_method_without_id_is_a_notification() {
        let err = JsonRpcRequest::from_value(json!({ "method": 3 })).unwrap_err();
        assert!(err.notification);
        assert!(err.error.message.contains("must be a string"));
    }

    #[test]
    fn unusable_ids_and_non_objects_are_invalid_requests() {
        for body in [json!({ "id": 1.5, "method": "ping" }), json!({ "id": [1], "method": "ping" }), json!([1, 2])] {
            let err = JsonRpcRequest::from_value(body.clone()).unwrap_err();
            assert_eq!(err.id, None, "{body}");
            assert!(!err.notification, "{body}");
            assert_eq!(err.error.code, JsonRpcError::INVALID_REQUEST, "{body}");
        }
    }

    #[test]
    fn non_string_version_fails_later_version_check() {
        let req = JsonRpcRequest::from_value(json!({ "jsonrpc": 2, "id": 1, "method": "ping" })).unwrap();
        assert_eq!(req.jsonrpc.as_deref(), Some("2"));
    }
}
