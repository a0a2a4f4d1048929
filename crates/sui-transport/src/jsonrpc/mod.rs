//! JSON-RPC 2.0 envelope, error type and transport seam.
//!
//! A request is `{jsonrpc: "2.0", id, method, params}`. A response carries
//! either `result` (success, returned verbatim) or `error {code, message, data?}`
//! which becomes [`RpcError::Remote`]. Every transport (HTTP, WebSocket, test
//! mocks) funnels through [`decode_response`] so both failure shapes surface as
//! the same error type.

pub mod http;
pub mod methods;
pub mod page;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

pub use http::HttpTransport;
pub use methods::{ExecuteRequestType, SuiRequest};
pub use page::{collect_pages, Page, PageRequest, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

pub const JSONRPC_VERSION: &str = "2.0";

/// Outgoing request envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    pub params: Value,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method: method.into(),
            params,
        }
    }
}

/// The `error` member of a failed response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Uniform failure of a remote call.
#[derive(Debug, Clone, Error)]
pub enum RpcError {
    /// The node answered with a JSON-RPC `error` member.
    #[error("{method} failed with code {code}: {message}")]
    Remote {
        method: String,
        code: i64,
        message: String,
        data: Option<Value>,
    },
    /// The request never produced a JSON-RPC response (socket, HTTP, DNS).
    #[error("{method} transport error: {message}")]
    Transport { method: String, message: String },
    #[error("{method} timed out after {after:?}")]
    Timeout { method: String, after: Duration },
    /// A response arrived but wasn't a valid envelope.
    #[error("{method} returned an invalid response: {message}")]
    Decode { method: String, message: String },
    #[error("connection closed")]
    Closed,
}

impl RpcError {
    pub fn transport(method: &str, message: impl ToString) -> Self {
        RpcError::Transport {
            method: method.to_string(),
            message: message.to_string(),
        }
    }

    pub fn decode(method: &str, message: impl ToString) -> Self {
        RpcError::Decode {
            method: method.to_string(),
            message: message.to_string(),
        }
    }

    /// Method the error is attributed to, if any.
    pub fn method(&self) -> Option<&str> {
        match self {
            RpcError::Remote { method, .. }
            | RpcError::Transport { method, .. }
            | RpcError::Timeout { method, .. }
            | RpcError::Decode { method, .. } => Some(method),
            RpcError::Closed => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, RpcError::Timeout { .. })
    }

    /// Whether the node rejected the call because the referenced entity doesn't exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            RpcError::Remote { message, .. } => {
                let lower = message.to_lowercase();
                lower.contains("could not find")
                    || lower.contains("not found")
                    || lower.contains("does not exist")
                    || lower.contains("notexists")
            }
            _ => false,
        }
    }

    /// Structured form for output records.
    pub fn to_json(&self) -> Value {
        match self {
            RpcError::Remote {
                method,
                code,
                message,
                data,
            } => serde_json::json!({
                "kind": "remote",
                "method": method,
                "code": code,
                "message": message,
                "data": data,
            }),
            RpcError::Transport { method, message } => serde_json::json!({
                "kind": "transport",
                "method": method,
                "message": message,
            }),
            RpcError::Timeout { method, after } => serde_json::json!({
                "kind": "timeout",
                "method": method,
                "afterMs": after.as_millis() as u64,
            }),
            RpcError::Decode { method, message } => serde_json::json!({
                "kind": "decode",
                "method": method,
                "message": message,
            }),
            RpcError::Closed => serde_json::json!({ "kind": "closed" }),
        }
    }
}

/// Result of a lookup that distinguishes absence from failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(v) => Some(v),
            Lookup::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }
}

impl Lookup<Value> {
    /// Classify an object response (`sui_getObject` / `sui_tryGetPastObject`).
    ///
    /// The node reports a missing object inside `result` as
    /// `{error: {code: "notExists" | "deleted" | ...}}` or a non-`VersionFound`
    /// status, not as a JSON-RPC error.
    pub fn from_object_response(result: Value) -> Self {
        if let Some(status) = result.get("status").and_then(Value::as_str) {
            return if status == "VersionFound" {
                Lookup::Found(result)
            } else {
                Lookup::NotFound
            };
        }
        let has_data = result.get("data").is_some_and(|d| !d.is_null());
        if has_data {
            Lookup::Found(result)
        } else {
            Lookup::NotFound
        }
    }
}

/// Turn a remote outcome into a [`Lookup`], mapping not-found errors to `NotFound`.
pub fn lookup(outcome: Result<Value, RpcError>) -> Result<Lookup<Value>, RpcError> {
    match outcome {
        Ok(Value::Null) => Ok(Lookup::NotFound),
        Ok(v) => Ok(Lookup::Found(v)),
        Err(e) if e.is_not_found() => Ok(Lookup::NotFound),
        Err(e) => Err(e),
    }
}

/// Decode a response envelope into its `result`.
///
/// `result: null` is a success carrying `null`; a body with neither `result` nor
/// `error` is a decode failure.
pub fn decode_response(method: &str, body: Value) -> Result<Value, RpcError> {
    let Value::Object(mut map) = body else {
        return Err(RpcError::decode(method, "response is not a JSON object"));
    };

    if let Some(error) = map.remove("error") {
        if !error.is_null() {
            let parsed: RpcErrorObject = serde_json::from_value(error.clone()).map_err(|_| {
                RpcError::decode(method, format!("malformed error member: {error}"))
            })?;
            return Err(RpcError::Remote {
                method: method.to_string(),
                code: parsed.code,
                message: parsed.message,
                data: parsed.data,
            });
        }
    }

    map.remove("result")
        .ok_or_else(|| RpcError::decode(method, "response has neither result nor error"))
}

/// Request/response channel to a Sui full node.
///
/// Implemented over HTTP by [`HttpTransport`] and by in-memory mocks in tests.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Issue one JSON-RPC call and return the decoded `result`.
    async fn call_raw(&self, method: &str, params: Value) -> Result<Value, RpcError>;

    /// Issue a typed request.
    async fn call(&self, request: &SuiRequest) -> Result<Value, RpcError> {
        self.call_raw(request.method(), request.params()).await
    }

    /// Human-readable endpoint, for logs.
    fn endpoint(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_envelope_shape() {
        let req = JsonRpcRequest::new(7, "suix_getBalance", json!(["0x1", null]));
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(
            v,
            json!({"jsonrpc": "2.0", "id": 7, "method": "suix_getBalance", "params": ["0x1", null]})
        );
    }

    #[test]
    fn test_decode_result_passthrough() {
        let body = json!({"jsonrpc": "2.0", "id": 1, "result": {"digest": "X"}});
        assert_eq!(
            decode_response("sui_getTransactionBlock", body).unwrap(),
            json!({"digest": "X"})
        );

        let null_result = json!({"jsonrpc": "2.0", "id": 1, "result": null});
        assert_eq!(decode_response("m", null_result).unwrap(), Value::Null);
    }

    #[test]
    fn test_decode_error_member() {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32602, "message": "Invalid params", "data": {"hint": 1}}
        });
        match decode_response("suix_getBalance", body).unwrap_err() {
            RpcError::Remote {
                method,
                code,
                message,
                data,
            } => {
                assert_eq!(method, "suix_getBalance");
                assert_eq!(code, -32602);
                assert_eq!(message, "Invalid params");
                assert_eq!(data, Some(json!({"hint": 1})));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_decode_missing_members() {
        let err = decode_response("m", json!({"jsonrpc": "2.0", "id": 1})).unwrap_err();
        assert!(matches!(err, RpcError::Decode { .. }));
        let err = decode_response("m", json!([1, 2])).unwrap_err();
        assert!(matches!(err, RpcError::Decode { .. }));
    }

    #[test]
    fn test_error_message_names_method() {
        let err = RpcError::Timeout {
            method: "suix_subscribeEvent".into(),
            after: Duration::from_secs(10),
        };
        assert!(err.to_string().contains("suix_subscribeEvent"));
        assert!(err.is_timeout());
        assert_eq!(err.to_json()["afterMs"], 10_000);
    }

    #[test]
    fn test_lookup_from_object_response() {
        let found = json!({"data": {"objectId": "0x1"}});
        assert!(Lookup::from_object_response(found).is_found());

        let missing = json!({"error": {"code": "notExists", "object_id": "0x1"}});
        assert_eq!(Lookup::from_object_response(missing), Lookup::NotFound);

        let past = json!({"status": "VersionNotFound", "details": ["0x1", 3]});
        assert_eq!(Lookup::from_object_response(past), Lookup::NotFound);
    }

    #[test]
    fn test_lookup_maps_not_found_errors() {
        let err = RpcError::Remote {
            method: "sui_getTransactionBlock".into(),
            code: -32602,
            message: "Could not find the referenced transaction [TransactionDigest(abc)].".into(),
            data: None,
        };
        assert_eq!(lookup(Err(err)).unwrap(), Lookup::NotFound);

        let other = RpcError::transport("m", "connection refused");
        assert!(lookup(Err(other)).is_err());
        assert_eq!(
            lookup(Ok(json!({"digest": "X"}))).unwrap(),
            Lookup::Found(json!({"digest": "X"}))
        );
    }
}
