//! Error types for operations.
//!
//! [`StepError`] is what a handler returns; the registry wraps it into an
//! [`OperationError`] that names the `resource.operation` that failed.

use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use sui_steps_transport::{NetworkError, RpcError};

/// Failure of a single operation step.
#[derive(Debug, Clone, Error)]
pub enum StepError {
    /// A parameter is missing or malformed. Raised before any I/O.
    #[error("invalid parameter '{parameter}': {message}")]
    Validation { parameter: String, message: String },

    /// The operation cannot run in the current session (no signer, production faucet).
    #[error("{0}")]
    Precondition(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("{what} not found")]
    NotFound { what: String },

    /// A local wait (confirmation poll, subscribe correlation) ran out of time.
    #[error("timed out waiting for {what} after {after:?}")]
    Timeout { what: String, after: Duration },

    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// Turning a plan into transaction data failed.
    #[error("transaction build failed: {0}")]
    Build(String),

    #[error("cancelled")]
    Cancelled,
}

impl StepError {
    pub fn validation(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        StepError::Validation {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        StepError::NotFound { what: what.into() }
    }

    pub fn build(message: impl ToString) -> Self {
        StepError::Build(message.to_string())
    }

    pub fn signer_required() -> Self {
        StepError::Precondition("signing key required".to_string())
    }

    /// Short machine-readable category.
    pub fn kind(&self) -> &'static str {
        match self {
            StepError::Validation { .. } => "validation",
            StepError::Precondition(_) => "precondition",
            StepError::InvalidKey(_) => "invalidKey",
            StepError::NotFound { .. } => "notFound",
            StepError::Timeout { .. } => "timeout",
            StepError::Rpc(e) if e.is_timeout() => "timeout",
            StepError::Rpc(_) => "rpc",
            StepError::Build(_) => "build",
            StepError::Cancelled => "cancelled",
        }
    }

    /// Whether the error was raised locally, before any remote call.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            StepError::Validation { .. } | StepError::Precondition(_) | StepError::InvalidKey(_)
        )
    }

    /// Structured details for error records.
    pub fn details(&self) -> Value {
        match self {
            StepError::Validation { parameter, message } => json!({
                "kind": self.kind(),
                "parameter": parameter,
                "message": message,
            }),
            StepError::NotFound { what } => json!({ "kind": self.kind(), "what": what }),
            StepError::Timeout { what, after } => json!({
                "kind": self.kind(),
                "what": what,
                "afterMs": after.as_millis() as u64,
            }),
            StepError::Rpc(e) => e.to_json(),
            other => json!({ "kind": other.kind(), "message": other.to_string() }),
        }
    }
}

impl From<NetworkError> for StepError {
    fn from(err: NetworkError) -> Self {
        let parameter = match err {
            NetworkError::UnknownNetwork(_) => "network",
            NetworkError::MissingRpcUrl => "rpcUrl",
            NetworkError::InvalidUrl(_) => "url",
        };
        StepError::validation(parameter, err.to_string())
    }
}

/// A [`StepError`] attributed to the operation that raised it.
#[derive(Debug, Clone, Error)]
#[error("{operation}: {error}")]
pub struct OperationError {
    /// `resource.operation`
    pub operation: String,
    #[source]
    pub error: StepError,
}

impl OperationError {
    pub fn new(operation: impl Into<String>, error: StepError) -> Self {
        Self {
            operation: operation.into(),
            error,
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "operation": self.operation,
            "message": self.to_string(),
            "details": self.error.details(),
        })
    }
}

pub type StepResult<T = Value> = Result<T, StepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_error_names_operation_and_parameter() {
        let err = OperationError::new(
            "account.getBalance",
            StepError::validation("address", "not a valid Sui address"),
        );
        let msg = err.to_string();
        assert!(msg.starts_with("account.getBalance: "));
        assert!(msg.contains("'address'"));
        assert_eq!(err.to_json()["details"]["kind"], "validation");
    }

    #[test]
    fn test_remote_error_preserves_code_and_message() {
        let err = StepError::from(RpcError::Remote {
            method: "suix_getBalance".into(),
            code: -32602,
            message: "Invalid params".into(),
            data: Some(json!({"hint": 1})),
        });
        let details = err.details();
        assert_eq!(details["kind"], "remote");
        assert_eq!(details["code"], -32602);
        assert_eq!(details["message"], "Invalid params");
        assert_eq!(details["data"]["hint"], 1);
        assert!(err.to_string().contains("suix_getBalance"));
    }

    #[test]
    fn test_timeout_kinds_are_distinct_from_remote() {
        let local = StepError::Timeout {
            what: "transaction 0xabc".into(),
            after: Duration::from_secs(5),
        };
        let remote = StepError::Rpc(RpcError::Timeout {
            method: "sui_getObject".into(),
            after: Duration::from_secs(30),
        });
        assert_eq!(local.kind(), "timeout");
        assert_eq!(remote.kind(), "timeout");
        assert_eq!(
            StepError::Rpc(RpcError::transport("sui_getObject", "refused")).kind(),
            "rpc"
        );
        assert_eq!(StepError::signer_required().kind(), "precondition");
    }
}
