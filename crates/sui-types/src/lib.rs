//! Shared value types for the sui-steps workspace.
//!
//! Pure, I/O-free helpers used by both the transport crate and the
//! operation layer:
//!
//! - [`address`] - address / object ID validation and normalization
//! - [`units`] - lossless smallest-unit <-> decimal conversion
//! - [`coin_type`] - `Coin<T>` type string helpers
//! - [`encoding`] - base64 / hex helpers
//! - [`env_utils`] - typed environment variable parsing

pub mod address;
pub mod coin_type;
pub mod encoding;
pub mod env_utils;
pub mod units;

pub use address::{is_valid_address, normalize_address, normalize_address_checked};
pub use coin_type::{build_coin_object_type, extract_coin_type, SUI_COIN_TYPE};
pub use env_utils::{env_string, env_var, env_var_or};
pub use units::{
    format_balance, from_smallest_unit, parse_balance, to_smallest_unit, UnitError, SUI_DECIMALS,
};
