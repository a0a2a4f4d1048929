#![allow(dead_code)]
//! Shared test utilities for integration tests.
//!
//! [`MockTransport`] answers JSON-RPC calls from a per-method script and
//! records every call, so tests can assert both outputs and the absence of
//! I/O.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use sui_steps::{Session, Settings, Signer};
use sui_steps_transport::{Network, NetworkEndpoints, RpcError, RpcTransport};

/// Raw 32-byte ed25519 seed used by every signing test.
pub const SEED_HEX: &str = "0x0101010101010101010101010101010101010101010101010101010101010101";

#[derive(Default)]
pub struct MockTransport {
    script: Mutex<HashMap<String, VecDeque<Result<Value, RpcError>>>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a result for `method`. The last queued answer repeats.
    pub fn respond(&self, method: &str, result: Value) {
        self.push(method, Ok(result));
    }

    /// Queue a JSON-RPC error for `method`.
    pub fn fail(&self, method: &str, code: i64, message: &str) {
        self.push(
            method,
            Err(RpcError::Remote {
                method: method.to_string(),
                code,
                message: message.to_string(),
                data: None,
            }),
        );
    }

    fn push(&self, method: &str, outcome: Result<Value, RpcError>) {
        self.script
            .lock()
            .entry(method.to_string())
            .or_default()
            .push_back(outcome);
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(m, _)| m.clone()).collect()
    }
}

#[async_trait]
impl RpcTransport for MockTransport {
    async fn call_raw(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        self.calls.lock().push((method.to_string(), params));
        let mut script = self.script.lock();
        let Some(queue) = script.get_mut(method) else {
            return Err(RpcError::Remote {
                method: method.to_string(),
                code: -32601,
                message: format!("no scripted response for {method}"),
                data: None,
            });
        };
        if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().unwrap()
        }
    }

    fn endpoint(&self) -> &str {
        "mock://testnet"
    }
}

fn fast_settings() -> Settings {
    Settings {
        poll_interval: Duration::from_millis(10),
        ..Settings::default()
    }
}

/// Testnet session over `mock`, no signer.
pub fn session(mock: &Arc<MockTransport>) -> Session {
    let endpoints = NetworkEndpoints::preset(Network::Testnet).unwrap();
    Session::with_transport(endpoints, mock.clone()).with_settings(fast_settings())
}

/// Testnet session over `mock` with the test signer.
pub fn signing_session(mock: &Arc<MockTransport>) -> Session {
    session(mock).with_signer(test_signer())
}

pub fn test_signer() -> Signer {
    Signer::from_key(SEED_HEX, None).unwrap()
}
