//! JSON-RPC 2.0 message types and the agent's method names.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Agent request: credential or signup-token login.
pub const LOGIN: &str = "codestream/login";
/// Agent notification: backend data changed.
pub const DID_CHANGE_DATA: &str = "codestream/didChangeData";
/// Agent notification: connection status changed.
pub const DID_CHANGE_CONNECTION_STATUS: &str = "codestream/didChangeConnectionStatus";
/// Agent notification: version compatibility changed.
pub const DID_CHANGE_VERSION_COMPATIBILITY: &str = "codestream/didChangeVersionCompatibility";
/// Agent notification: code markers of an open document changed.
pub const DID_CHANGE_DOCUMENT_MARKERS: &str = "codestream/didChangeDocumentMarkers";
/// Agent notification: the agent dropped the session.
pub const DID_LOGOUT: &str = "codestream/didLogout";
/// Agent notification: a login started.
pub const DID_START_LOGIN: &str = "codestream/didStartLogin";
/// Agent notification: a login succeeded.
pub const DID_LOGIN: &str = "codestream/didLogin";
/// Agent notification: a login failed.
pub const DID_FAIL_LOGIN: &str = "codestream/didFailLogin";

/// JSON-RPC "method not found".
pub const METHOD_NOT_FOUND: i64 = -32601;

/// Any JSON-RPC message. Variant order matters for untagged matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    /// Has `id` and `method`.
    Request(JsonRpcRequest),
    /// Has `id` and `result` or `error`.
    Response(JsonRpcResponse),
    /// Has `method` only.
    Notification(JsonRpcNotification),
}

/// A request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Always `"2.0"`.
    pub jsonrpc: String,
    /// Request id.
    pub id: Value,
    /// Method name.
    pub method: String,
    /// Params.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Create a request with a numeric id.
    #[must_use]
    pub fn new(id: u64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_owned(),
            id: Value::from(id),
            method: method.into(),
            params,
        }
    }
}

/// A response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Always `"2.0"`.
    pub jsonrpc: String,
    /// Id of the answered request.
    pub id: Value,
    /// Success result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Error response for `id`.
    #[must_use]
    pub fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_owned(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }
}

/// A notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    /// Always `"2.0"`.
    pub jsonrpc: String,
    /// Method name.
    pub method: String,
    /// Params.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    /// Create a notification.
    #[must_use]
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_owned(),
            method: method.into(),
            params,
        }
    }
}

/// A JSON-RPC error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code.
    pub code: i64,
    /// Message.
    pub message: String,
    /// Extra data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_untagged_classification() {
        let req: JsonRpcMessage =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": 1, "method": "x"})).unwrap();
        assert!(matches!(req, JsonRpcMessage::Request(_)));

        let resp: JsonRpcMessage =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": 1, "result": {}})).unwrap();
        assert!(matches!(resp, JsonRpcMessage::Response(_)));

        let note: JsonRpcMessage = serde_json::from_value(
            json!({"jsonrpc": "2.0", "method": "codestream/didChangeData", "params": []}),
        )
        .unwrap();
        assert!(matches!(note, JsonRpcMessage::Notification(_)));
    }

    #[test]
    fn test_request_serialization_omits_missing_params() {
        let value = serde_json::to_value(JsonRpcRequest::new(7, "codestream/login", None)).unwrap();
        assert_eq!(value, json!({"jsonrpc": "2.0", "id": 7, "method": "codestream/login"}));
    }
}
