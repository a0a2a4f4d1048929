//! JSON-RPC over HTTPS using a blocking `ureq` agent.
//!
//! The agent is synchronous; async callers go through [`RpcTransport::call_raw`],
//! which moves the request onto tokio's blocking pool.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::{decode_response, JsonRpcRequest, RpcError, RpcTransport};
use sui_steps_types::env_utils::env_var_or;

/// HTTP JSON-RPC client bound to one full node endpoint.
#[derive(Clone)]
pub struct HttpTransport {
    endpoint: String,
    agent: ureq::Agent,
    timeout: Duration,
    next_id: Arc<AtomicU64>,
}

impl HttpTransport {
    /// Default request timeout in seconds (can be overridden by env).
    const DEFAULT_TIMEOUT_SECS: u64 = 30;
    /// Default connect timeout in seconds (can be overridden by env).
    const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

    pub fn default_timeouts() -> (Duration, Duration) {
        let timeout_secs = env_var_or("SUI_STEPS_TIMEOUT_SECS", Self::DEFAULT_TIMEOUT_SECS);
        let connect_secs = env_var_or(
            "SUI_STEPS_CONNECT_TIMEOUT_SECS",
            Self::DEFAULT_CONNECT_TIMEOUT_SECS,
        );
        (
            Duration::from_secs(timeout_secs),
            Duration::from_secs(connect_secs),
        )
    }

    fn build_agent(timeout: Duration, connect_timeout: Duration) -> ureq::Agent {
        ureq::AgentBuilder::new()
            .timeout(timeout)
            .timeout_connect(connect_timeout)
            .build()
    }

    /// Create a client with env-derived timeouts.
    pub fn new(endpoint: &str) -> Self {
        let (timeout, connect_timeout) = Self::default_timeouts();
        Self::with_timeouts(endpoint, timeout, connect_timeout)
    }

    /// Create a client with explicit timeouts.
    pub fn with_timeouts(endpoint: &str, timeout: Duration, connect_timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            agent: Self::build_agent(timeout, connect_timeout),
            timeout,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Blocking call; used directly by synchronous callers.
    pub fn call_blocking(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = JsonRpcRequest::new(id, method, params);
        debug!(method, id, endpoint = %self.endpoint, "json-rpc request");

        let response = self
            .agent
            .post(&self.endpoint)
            .set("Content-Type", "application/json")
            .send_json(&body);

        let body: Value = match response {
            Ok(resp) => resp
                .into_json()
                .map_err(|e| RpcError::decode(method, format!("failed to parse response: {e}")))?,
            // Nodes answer some JSON-RPC errors with a non-2xx status; keep their envelope.
            Err(ureq::Error::Status(code, resp)) => match resp.into_json::<Value>() {
                Ok(body) if body.get("error").is_some() => body,
                _ => return Err(RpcError::transport(method, format!("HTTP status {code}"))),
            },
            Err(ureq::Error::Transport(t)) => {
                let message = t.to_string();
                if message.to_lowercase().contains("timed out") {
                    return Err(RpcError::Timeout {
                        method: method.to_string(),
                        after: self.timeout,
                    });
                }
                return Err(RpcError::transport(method, message));
            }
        };

        decode_response(method, body)
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn call_raw(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let this = self.clone();
        let owned_method = method.to_string();
        tokio::task::spawn_blocking(move || this.call_blocking(&owned_method, params))
            .await
            .map_err(|e| RpcError::transport(method, format!("request task failed: {e}")))?
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = HttpTransport::new("https://fullnode.testnet.sui.io:443");
        assert_eq!(client.endpoint(), "https://fullnode.testnet.sui.io:443");

        let custom = HttpTransport::with_timeouts(
            "http://127.0.0.1:9000",
            Duration::from_secs(1),
            Duration::from_secs(1),
        );
        assert_eq!(custom.timeout, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        // Port 9 (discard) on localhost is not expected to run an HTTP server.
        let client = HttpTransport::with_timeouts(
            "http://127.0.0.1:9",
            Duration::from_secs(2),
            Duration::from_secs(2),
        );
        let err = client
            .call_raw("sui_getChainIdentifier", serde_json::json!([]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RpcError::Transport { .. } | RpcError::Timeout { .. }
        ));
        assert_eq!(err.method(), Some("sui_getChainIdentifier"));
    }

    /// Run with: cargo test -p sui-steps-transport test_live_chain_identifier -- --ignored
    #[tokio::test]
    #[ignore]
    async fn test_live_chain_identifier() {
        let client = HttpTransport::new("https://fullnode.mainnet.sui.io:443");
        let id = client
            .call_raw("sui_getChainIdentifier", serde_json::json!([]))
            .await
            .unwrap();
        assert!(id.as_str().is_some());
    }
}
