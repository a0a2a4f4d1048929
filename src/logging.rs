//! Process logging setup and log-safe views of step inputs.

use serde_json::Value;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info";
const REDACTED: &str = "***redacted***";

/// Install the global subscriber and emit the startup line.
///
/// Call once from `main`. `RUST_LOG` overrides the default `info` filter;
/// logs go to stderr so stdout stays machine-readable.
pub fn init_logging() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let installed = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok();
    if installed {
        info!(version = env!("CARGO_PKG_VERSION"), "sui-steps starting");
    }
}

/// Copy of `value` with key, token, secret and password members masked.
pub fn redact_sensitive(value: &Value) -> Value {
    fn redact_value(value: &Value) -> Value {
        match value {
            Value::Object(map) => {
                let mut new_map = serde_json::Map::new();
                for (k, v) in map {
                    if is_sensitive_key(k) {
                        new_map.insert(k.clone(), Value::String(REDACTED.to_string()));
                    } else {
                        new_map.insert(k.clone(), redact_value(v));
                    }
                }
                Value::Object(new_map)
            }
            Value::Array(arr) => Value::Array(arr.iter().map(redact_value).collect()),
            _ => value.clone(),
        }
    }

    redact_value(value)
}

fn is_sensitive_key(key: &str) -> bool {
    let key_l = key.to_lowercase();
    key_l.contains("privatekey")
        || key_l.contains("private_key")
        || key_l.contains("secret")
        || key_l.contains("token")
        || key_l.contains("password")
        || key_l == "key"
        || key_l == "signature"
        || key_l == "signatures"
}
