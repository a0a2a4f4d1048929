//! Sui operations for item-based workflow hosts.
//!
//! A host hands over a resource, an operation and a list of parameter items;
//! each item becomes one JSON-RPC request (or a build, sign and submit
//! sequence) against a Sui full node, and one output record.
//!
//! - [`registry`] is the operation catalog with parameter schemas
//! - [`runner`] runs a batch of items with per-item failure handling
//! - [`session`] binds a transport, network endpoints and an optional signer
//! - [`tx`] builds programmable transactions and submits them
//!
//! Unit conversion and address helpers live in `sui_steps_types`; the
//! JSON-RPC client and WebSocket subscriptions in `sui_steps_transport`.

#![allow(clippy::result_large_err)]

pub mod config;
pub mod error;
pub mod logging;
pub(crate) mod operations;
pub mod params;
pub mod registry;
pub mod response;
pub mod runner;
pub mod schema;
pub mod session;
pub mod signer;
pub mod tx;

pub use config::{Credentials, Settings};
pub use error::{OperationError, StepError, StepResult};
pub use logging::init_logging;
pub use params::Params;
pub use registry::{execute, find, registry, resources, schema_json, OperationDef};
pub use response::StepRecord;
pub use runner::ItemRunner;
pub use session::{Session, SessionState};
pub use signer::{KeyScheme, Signer};
