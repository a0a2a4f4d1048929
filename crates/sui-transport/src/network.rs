//! Network presets and endpoint resolution.
//!
//! Every credential set targets exactly one network. The four public presets
//! carry fixed endpoints; `custom` requires an explicit RPC URL and derives the
//! WebSocket URL from it unless one is given.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const MAINNET_RPC: &str = "https://fullnode.mainnet.sui.io:443";
const TESTNET_RPC: &str = "https://fullnode.testnet.sui.io:443";
const DEVNET_RPC: &str = "https://fullnode.devnet.sui.io:443";
const LOCALNET_RPC: &str = "http://127.0.0.1:9000";

const MAINNET_WS: &str = "wss://fullnode.mainnet.sui.io:443";
const TESTNET_WS: &str = "wss://fullnode.testnet.sui.io:443";
const DEVNET_WS: &str = "wss://fullnode.devnet.sui.io:443";
const LOCALNET_WS: &str = "ws://127.0.0.1:9000";

const TESTNET_FAUCET: &str = "https://faucet.testnet.sui.io/v2/gas";
const DEVNET_FAUCET: &str = "https://faucet.devnet.sui.io/v2/gas";
const LOCALNET_FAUCET: &str = "http://127.0.0.1:9123/gas";

/// Named network preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
    Devnet,
    Localnet,
    Custom,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Devnet => "devnet",
            Network::Localnet => "localnet",
            Network::Custom => "custom",
        }
    }

    /// Whether a faucet request makes sense on this network.
    pub fn is_production(&self) -> bool {
        matches!(self, Network::Mainnet)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "devnet" => Ok(Network::Devnet),
            "localnet" | "local" => Ok(Network::Localnet),
            "custom" => Ok(Network::Custom),
            other => Err(NetworkError::UnknownNetwork(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("unknown network '{0}' (expected mainnet, testnet, devnet, localnet or custom)")]
    UnknownNetwork(String),
    #[error("custom network requires an RPC URL")]
    MissingRpcUrl,
    #[error("invalid endpoint URL '{0}': expected http(s):// or ws(s)://")]
    InvalidUrl(String),
}

/// Resolved endpoints for one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkEndpoints {
    pub network: Network,
    pub rpc_url: String,
    pub ws_url: String,
    pub faucet_url: Option<String>,
}

impl NetworkEndpoints {
    /// Endpoints of a named preset. Fails for [`Network::Custom`].
    pub fn preset(network: Network) -> Result<Self, NetworkError> {
        let (rpc, ws, faucet) = match network {
            Network::Mainnet => (MAINNET_RPC, MAINNET_WS, None),
            Network::Testnet => (TESTNET_RPC, TESTNET_WS, Some(TESTNET_FAUCET)),
            Network::Devnet => (DEVNET_RPC, DEVNET_WS, Some(DEVNET_FAUCET)),
            Network::Localnet => (LOCALNET_RPC, LOCALNET_WS, Some(LOCALNET_FAUCET)),
            Network::Custom => return Err(NetworkError::MissingRpcUrl),
        };
        Ok(Self {
            network,
            rpc_url: rpc.to_string(),
            ws_url: ws.to_string(),
            faucet_url: faucet.map(String::from),
        })
    }

    /// Resolve endpoints, letting explicit URLs override the preset.
    ///
    /// For `custom` the RPC URL is mandatory and the WebSocket URL defaults to
    /// the RPC URL with its scheme switched to `ws`/`wss`.
    pub fn resolve(
        network: Network,
        rpc_url: Option<&str>,
        ws_url: Option<&str>,
        faucet_url: Option<&str>,
    ) -> Result<Self, NetworkError> {
        let non_empty: fn(Option<&str>) -> Option<&str> = |s| s.map(str::trim).filter(|s| !s.is_empty());
        let rpc_url = non_empty(rpc_url);
        let ws_url = non_empty(ws_url);
        let faucet_url = non_empty(faucet_url);

        let mut endpoints = match network {
            Network::Custom => {
                let rpc = rpc_url.ok_or(NetworkError::MissingRpcUrl)?;
                Self {
                    network,
                    rpc_url: rpc.to_string(),
                    ws_url: websocket_url_for(rpc)?,
                    faucet_url: None,
                }
            }
            preset => {
                let mut endpoints = Self::preset(preset)?;
                if let Some(rpc) = rpc_url {
                    endpoints.rpc_url = rpc.to_string();
                }
                endpoints
            }
        };

        check_http_url(&endpoints.rpc_url)?;
        if let Some(ws) = ws_url {
            check_ws_url(ws)?;
            endpoints.ws_url = ws.to_string();
        }
        if let Some(faucet) = faucet_url {
            check_http_url(faucet)?;
            endpoints.faucet_url = Some(faucet.to_string());
        }
        Ok(endpoints)
    }
}

fn check_http_url(url: &str) -> Result<(), NetworkError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(NetworkError::InvalidUrl(url.to_string()))
    }
}

fn check_ws_url(url: &str) -> Result<(), NetworkError> {
    if url.starts_with("ws://") || url.starts_with("wss://") {
        Ok(())
    } else {
        Err(NetworkError::InvalidUrl(url.to_string()))
    }
}

/// Switch an `http(s)` URL to the matching `ws(s)` scheme.
pub fn websocket_url_for(rpc_url: &str) -> Result<String, NetworkError> {
    if let Some(rest) = rpc_url.strip_prefix("https://") {
        Ok(format!("wss://{rest}"))
    } else if let Some(rest) = rpc_url.strip_prefix("http://") {
        Ok(format!("ws://{rest}"))
    } else {
        Err(NetworkError::InvalidUrl(rpc_url.to_string()))
    }
}

/// Best-effort guess of the network behind an endpoint URL.
pub fn infer_network_from_url(url: &str) -> Option<Network> {
    let lower = url.to_lowercase();
    if lower.contains("testnet") {
        Some(Network::Testnet)
    } else if lower.contains("devnet") {
        Some(Network::Devnet)
    } else if lower.contains("mainnet") {
        Some(Network::Mainnet)
    } else if lower.contains("127.0.0.1") || lower.contains("localhost") {
        Some(Network::Localnet)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let testnet = NetworkEndpoints::preset(Network::Testnet).unwrap();
        assert_eq!(testnet.rpc_url, "https://fullnode.testnet.sui.io:443");
        assert_eq!(testnet.ws_url, "wss://fullnode.testnet.sui.io:443");
        assert!(testnet.faucet_url.is_some());

        let mainnet = NetworkEndpoints::preset(Network::Mainnet).unwrap();
        assert!(mainnet.faucet_url.is_none());

        assert_eq!(
            NetworkEndpoints::preset(Network::Custom),
            Err(NetworkError::MissingRpcUrl)
        );
    }

    #[test]
    fn test_custom_requires_rpc_url() {
        assert_eq!(
            NetworkEndpoints::resolve(Network::Custom, None, None, None),
            Err(NetworkError::MissingRpcUrl)
        );
        assert_eq!(
            NetworkEndpoints::resolve(Network::Custom, Some("  "), None, None),
            Err(NetworkError::MissingRpcUrl)
        );

        let custom =
            NetworkEndpoints::resolve(Network::Custom, Some("https://rpc.example.com"), None, None)
                .unwrap();
        assert_eq!(custom.ws_url, "wss://rpc.example.com");
        assert!(custom.faucet_url.is_none());
    }

    #[test]
    fn test_overrides() {
        let endpoints = NetworkEndpoints::resolve(
            Network::Devnet,
            Some("http://10.0.0.1:9000"),
            Some("ws://10.0.0.1:9001"),
            Some("http://10.0.0.1:9123/gas"),
        )
        .unwrap();
        assert_eq!(endpoints.rpc_url, "http://10.0.0.1:9000");
        assert_eq!(endpoints.ws_url, "ws://10.0.0.1:9001");
        assert_eq!(endpoints.faucet_url.as_deref(), Some("http://10.0.0.1:9123/gas"));

        assert!(matches!(
            NetworkEndpoints::resolve(Network::Mainnet, Some("ftp://x"), None, None),
            Err(NetworkError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_network_from_str() {
        assert_eq!("TESTNET".parse::<Network>().unwrap(), Network::Testnet);
        assert_eq!("local".parse::<Network>().unwrap(), Network::Localnet);
        assert!("moonnet".parse::<Network>().is_err());
    }

    #[test]
    fn test_infer_network_from_url() {
        assert_eq!(
            infer_network_from_url("https://fullnode.testnet.sui.io:443"),
            Some(Network::Testnet)
        );
        assert_eq!(
            infer_network_from_url("http://127.0.0.1:9000"),
            Some(Network::Localnet)
        );
        assert_eq!(infer_network_from_url("https://rpc.example.com"), None);
    }
}
