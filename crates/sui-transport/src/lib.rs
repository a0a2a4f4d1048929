//! Sui JSON-RPC transport for sui-steps.
//!
//! This crate provides:
//! - [`network`]: network presets (mainnet/testnet/devnet/localnet/custom) and endpoint resolution
//! - [`jsonrpc`]: request/response envelope, the typed [`SuiRequest`] catalog, the
//!   [`RpcTransport`] seam with its HTTP implementation, and cursor pagination
//! - [`faucet`]: faucet client for non-production networks
//! - [`ws`]: WebSocket subscription client with exponential-backoff reconnect
//!
//! # Example
//!
//! ```ignore
//! use sui_steps_transport::{HttpTransport, RpcTransport, SuiRequest};
//!
//! let client = HttpTransport::new("https://fullnode.testnet.sui.io:443");
//! let gas_price = client.call(&SuiRequest::GetReferenceGasPrice).await?;
//! ```

pub mod backoff;
pub mod faucet;
pub mod jsonrpc;
pub mod network;
pub mod ws;

pub use backoff::ReconnectPolicy;
pub use faucet::FaucetClient;
pub use jsonrpc::{
    decode_response, lookup, HttpTransport, Lookup, Page, PageRequest, RpcError, RpcTransport,
    SuiRequest,
};
pub use network::{Network, NetworkEndpoints, NetworkError};
pub use ws::{
    ConnectionState, SubscriptionClient, SubscriptionConfig, SubscriptionEvent, SubscriptionKind,
};
