//! Environment variable parsing utilities.
//!
//! Configuration for the steps (network, timeouts, reconnect policy) is read
//! from the environment with typed defaults:
//!
//! ```
//! use sui_steps_types::env_utils::{env_string, env_var_or};
//!
//! let timeout: u64 = env_var_or("SUI_STEPS_TIMEOUT_SECS", 30);
//! let rpc_url: Option<String> = env_string("SUI_RPC_URL");
//! # let _ = (timeout, rpc_url);
//! ```

use std::str::FromStr;

/// Parse an environment variable into a type that implements `FromStr`.
///
/// Returns `None` if the variable is not set or cannot be parsed.
pub fn env_var<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Parse an environment variable with a default value.
///
/// Returns the default if the variable is not set or cannot be parsed.
pub fn env_var_or<T: FromStr>(key: &str, default: T) -> T {
    env_var(key).unwrap_or(default)
}

/// Get a non-empty, trimmed environment variable.
pub fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
