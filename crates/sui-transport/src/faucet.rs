//! Testnet/devnet/localnet faucet client.

use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::jsonrpc::RpcError;

const FAUCET_METHOD: &str = "faucet";

#[derive(Clone)]
pub struct FaucetClient {
    url: String,
    agent: ureq::Agent,
    timeout: Duration,
}

impl FaucetClient {
    pub fn new(url: &str, timeout: Duration) -> Self {
        Self {
            url: url.to_string(),
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Request body for the v2 gas endpoint.
    pub fn request_body(recipient: &str) -> Value {
        json!({ "FixedAmountRequest": { "recipient": recipient } })
    }

    fn request_blocking(&self, recipient: &str) -> Result<Value, RpcError> {
        debug!(url = %self.url, recipient, "faucet request");
        let response = self
            .agent
            .post(&self.url)
            .set("Content-Type", "application/json")
            .send_json(Self::request_body(recipient));

        let body: Value = match response {
            Ok(resp) => resp
                .into_json()
                .map_err(|e| RpcError::decode(FAUCET_METHOD, e))?,
            Err(ureq::Error::Status(code, resp)) => {
                let text = resp.into_string().unwrap_or_default();
                return Err(RpcError::Remote {
                    method: FAUCET_METHOD.to_string(),
                    code: i64::from(code),
                    message: if text.is_empty() {
                        format!("HTTP status {code}")
                    } else {
                        text
                    },
                    data: None,
                });
            }
            Err(ureq::Error::Transport(t)) => {
                let message = t.to_string();
                if message.to_lowercase().contains("timed out") {
                    return Err(RpcError::Timeout {
                        method: FAUCET_METHOD.to_string(),
                        after: self.timeout,
                    });
                }
                return Err(RpcError::transport(FAUCET_METHOD, message));
            }
        };

        // v2 reports failures in-band as {"status": {"Failure": ...}}.
        if let Some(failure) = body.get("status").and_then(|s| s.get("Failure")) {
            return Err(RpcError::Remote {
                method: FAUCET_METHOD.to_string(),
                code: -1,
                message: failure.to_string(),
                data: Some(body.clone()),
            });
        }
        if let Some(error) = body.get("error").and_then(Value::as_str) {
            return Err(RpcError::Remote {
                method: FAUCET_METHOD.to_string(),
                code: -1,
                message: error.to_string(),
                data: Some(body.clone()),
            });
        }
        Ok(body)
    }

    /// Ask the faucet to fund `recipient`; returns the faucet's JSON body.
    pub async fn request(&self, recipient: &str) -> Result<Value, RpcError> {
        let this = self.clone();
        let recipient = recipient.to_string();
        tokio::task::spawn_blocking(move || this.request_blocking(&recipient))
            .await
            .map_err(|e| RpcError::transport(FAUCET_METHOD, format!("request task failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body() {
        assert_eq!(
            FaucetClient::request_body("0xabc"),
            json!({"FixedAmountRequest": {"recipient": "0xabc"}})
        );
    }

    #[tokio::test]
    async fn test_unreachable_faucet() {
        let faucet = FaucetClient::new("http://127.0.0.1:9/gas", Duration::from_secs(2));
        let err = faucet.request("0xabc").await.unwrap_err();
        assert_eq!(err.method(), Some("faucet"));
    }
}
