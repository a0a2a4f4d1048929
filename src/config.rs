//! Credentials and runtime settings.
//!
//! Credentials come from a host-supplied JSON object or from `SUI_*`
//! environment variables. Settings (timeouts, poll interval, reconnect policy)
//! are env-driven with defaults.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::StepError;
use crate::signer::KeyScheme;
use sui_steps_transport::network::infer_network_from_url;
use sui_steps_transport::{HttpTransport, Network, NetworkEndpoints, ReconnectPolicy};
use sui_steps_types::env_utils::{env_string, env_var_or};

/// Host-managed credential fields for one network.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    #[serde(default)]
    pub network: Network,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ws_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faucet_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_scheme: Option<KeyScheme>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("network", &self.network)
            .field("rpc_url", &self.rpc_url)
            .field("ws_url", &self.ws_url)
            .field("faucet_url", &self.faucet_url)
            .field(
                "private_key",
                &self.private_key.as_ref().map(|_| "***redacted***"),
            )
            .field("key_scheme", &self.key_scheme)
            .finish()
    }
}

impl Credentials {
    pub fn for_network(network: Network) -> Self {
        Self {
            network,
            ..Self::default()
        }
    }

    /// Read `SUI_NETWORK`, `SUI_RPC_URL`, `SUI_WS_URL`, `SUI_FAUCET_URL`,
    /// `SUI_PRIVATE_KEY` and `SUI_KEY_SCHEME`.
    ///
    /// Without `SUI_NETWORK`, a configured RPC URL selects the network it
    /// names, or `custom` when it names none.
    pub fn from_env() -> Result<Self, StepError> {
        let rpc_url = env_string("SUI_RPC_URL");
        let network = match env_string("SUI_NETWORK") {
            Some(name) => name.parse::<Network>()?,
            None => match rpc_url.as_deref() {
                Some(url) => infer_network_from_url(url).unwrap_or(Network::Custom),
                None => Network::default(),
            },
        };
        let key_scheme = env_string("SUI_KEY_SCHEME")
            .map(|s| s.parse::<KeyScheme>())
            .transpose()?;

        Ok(Self {
            network,
            rpc_url,
            ws_url: env_string("SUI_WS_URL"),
            faucet_url: env_string("SUI_FAUCET_URL"),
            private_key: env_string("SUI_PRIVATE_KEY"),
            key_scheme,
        })
    }

    /// Parse a host credential object.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, StepError> {
        serde_json::from_value(value.clone())
            .map_err(|e| StepError::validation("credentials", e.to_string()))
    }

    pub fn endpoints(&self) -> Result<NetworkEndpoints, StepError> {
        Ok(NetworkEndpoints::resolve(
            self.network,
            self.rpc_url.as_deref(),
            self.ws_url.as_deref(),
            self.faucet_url.as_deref(),
        )?)
    }

    pub fn has_key(&self) -> bool {
        self.private_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }
}

/// Timeouts and intervals shared by every operation in a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub subscribe_timeout: Duration,
    /// Interval between `waitForConfirmation` polls.
    pub poll_interval: Duration,
    pub reconnect: ReconnectPolicy,
}

impl Settings {
    const DEFAULT_SUBSCRIBE_TIMEOUT_SECS: u64 = 10;
    const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

    pub fn from_env() -> Self {
        let (request_timeout, connect_timeout) = HttpTransport::default_timeouts();
        Self {
            request_timeout,
            connect_timeout,
            subscribe_timeout: Duration::from_secs(env_var_or(
                "SUI_STEPS_SUBSCRIBE_TIMEOUT_SECS",
                Self::DEFAULT_SUBSCRIBE_TIMEOUT_SECS,
            )),
            poll_interval: Duration::from_millis(env_var_or(
                "SUI_STEPS_POLL_INTERVAL_MS",
                Self::DEFAULT_POLL_INTERVAL_MS,
            )),
            reconnect: ReconnectPolicy::from_env(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            subscribe_timeout: Duration::from_secs(Self::DEFAULT_SUBSCRIBE_TIMEOUT_SECS),
            poll_interval: Duration::from_millis(Self::DEFAULT_POLL_INTERVAL_MS),
            reconnect: ReconnectPolicy::default(),
        }
    }
}
