//! Address and object ID validation and normalization.
//!
//! This module is the canonical source for address handling in the workspace.
//! Other crates should import from here rather than defining their own logic.
//!
//! Sui addresses are 32-byte values, but they're often represented in different formats:
//! - Short form: "0x2"
//! - Full form: "0x0000000000000000000000000000000000000000000000000000000000000002"
//! - Without prefix: "2"
//!
//! Validation ([`is_valid_address`]) is strict and accepts only the full form.
//! Normalization ([`normalize_address_checked`]) accepts any valid hex of at most
//! 64 characters and left-pads it.

use move_core_types::account_address::AccountAddress;

/// Number of hex characters in a full-form address.
pub const ADDRESS_HEX_LEN: usize = 64;

fn strip_hex_prefix(addr: &str) -> &str {
    addr.strip_prefix("0x")
        .or_else(|| addr.strip_prefix("0X"))
        .unwrap_or(addr)
}

/// Check that `addr` is exactly 64 hex characters, with an optional `0x` prefix.
///
/// # Examples
///
/// ```
/// use sui_steps_types::address::is_valid_address;
///
/// assert!(is_valid_address(&format!("0x{}", "a".repeat(64))));
/// assert!(is_valid_address(&"0".repeat(64)));
/// assert!(!is_valid_address("0x2"));
/// assert!(!is_valid_address(&format!("0x{}", "g".repeat(64))));
/// ```
pub fn is_valid_address(addr: &str) -> bool {
    let hex = strip_hex_prefix(addr);
    hex.len() == ADDRESS_HEX_LEN && hex.chars().all(|c| c.is_ascii_hexdigit())
}

/// Normalize an address to lowercase with 0x prefix and full 64 hex characters.
///
/// This is the lenient form: input is trimmed and left-padded without validating
/// the characters. Use [`normalize_address_checked`] for user input.
///
/// # Examples
///
/// ```
/// use sui_steps_types::address::normalize_address;
///
/// assert_eq!(
///     normalize_address("0x2"),
///     "0x0000000000000000000000000000000000000000000000000000000000000002"
/// );
/// assert_eq!(
///     normalize_address("ABC"),
///     "0x0000000000000000000000000000000000000000000000000000000000000abc"
/// );
/// ```
pub fn normalize_address(addr: &str) -> String {
    let hex = strip_hex_prefix(addr.trim()).to_lowercase();
    if hex.len() < ADDRESS_HEX_LEN {
        format!("0x{:0>64}", hex)
    } else {
        format!("0x{}", &hex[..ADDRESS_HEX_LEN])
    }
}

/// Normalize an address, returning None unless it's 1..=64 hex characters.
///
/// An already-normalized address is returned unchanged.
///
/// # Examples
///
/// ```
/// use sui_steps_types::address::normalize_address_checked;
///
/// assert_eq!(
///     normalize_address_checked("0x2"),
///     Some("0x0000000000000000000000000000000000000000000000000000000000000002".to_string())
/// );
/// assert_eq!(normalize_address_checked("not-hex"), None);
/// ```
pub fn normalize_address_checked(addr: &str) -> Option<String> {
    let hex = strip_hex_prefix(addr.trim());
    if hex.is_empty()
        || hex.len() > ADDRESS_HEX_LEN
        || !hex.chars().all(|c| c.is_ascii_hexdigit())
    {
        return None;
    }
    Some(normalize_address(hex))
}

/// Normalize an address to short form (minimal hex digits).
///
/// Used for display of framework packages such as `0x2`.
///
/// # Examples
///
/// ```
/// use sui_steps_types::address::normalize_address_short;
///
/// assert_eq!(normalize_address_short("0x0000000000000000000000000000000000000000000000000000000000000002"), "0x2");
/// assert_eq!(normalize_address_short("0x00abc"), "0xabc");
/// ```
pub fn normalize_address_short(addr: &str) -> String {
    let normalized = normalize_address(addr);
    let hex = normalized.strip_prefix("0x").unwrap_or(&normalized);
    let trimmed = hex.trim_start_matches('0');
    if trimmed.is_empty() {
        "0x0".to_string()
    } else {
        format!("0x{}", trimmed)
    }
}

/// Parse a string address into an AccountAddress.
///
/// Handles both short ("0x2") and full forms; rejects anything that isn't hex.
pub fn parse_address(addr: &str) -> Option<AccountAddress> {
    let normalized = normalize_address_checked(addr)?;
    AccountAddress::from_hex_literal(&normalized).ok()
}

/// Convert an AccountAddress to its normalized full-form string.
pub fn address_to_string(addr: &AccountAddress) -> String {
    format!("0x{}", hex::encode(addr.as_ref()))
}

// =============================================================================
// ID Normalization Aliases
// =============================================================================
// Object and package IDs are the same 32-byte hex values as wallet addresses.

/// Normalize an object/package ID; alias for [`normalize_address_checked`].
#[inline]
pub fn normalize_id(id: &str) -> Option<String> {
    normalize_address_checked(id)
}

/// Check an object/package ID; alias for [`is_valid_address`].
#[inline]
pub fn is_valid_object_id(id: &str) -> bool {
    is_valid_address(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_TWO: &str = "0x0000000000000000000000000000000000000000000000000000000000000002";

    #[test]
    fn test_is_valid_address() {
        assert!(is_valid_address(FULL_TWO));
        assert!(is_valid_address(&FULL_TWO[2..]));
        assert!(is_valid_address(&format!("0X{}", "AbCdEf01".repeat(8))));

        assert!(!is_valid_address("0x2"));
        assert!(!is_valid_address(""));
        assert!(!is_valid_address("0x"));
        assert!(!is_valid_address(&format!("0x{}", "a".repeat(63))));
        assert!(!is_valid_address(&format!("0x{}", "a".repeat(65))));
        assert!(!is_valid_address(&format!("0x{}z", "a".repeat(63))));
        assert!(!is_valid_address(&format!(" {}", FULL_TWO)));
    }

    #[test]
    fn test_normalize_address() {
        assert_eq!(
            normalize_address("0xABC"),
            "0x0000000000000000000000000000000000000000000000000000000000000abc"
        );
        assert_eq!(normalize_address("  0x2  "), FULL_TWO);
        assert_eq!(
            normalize_address("0XABC"),
            "0x0000000000000000000000000000000000000000000000000000000000000abc"
        );
    }

    #[test]
    fn test_normalize_address_checked() {
        assert_eq!(normalize_address_checked("0x2").as_deref(), Some(FULL_TWO));
        assert_eq!(normalize_address_checked(FULL_TWO).as_deref(), Some(FULL_TWO));
        assert!(normalize_address_checked("not-hex").is_none());
        assert!(normalize_address_checked("0xGGG").is_none());
        assert!(normalize_address_checked("0x").is_none());
        assert!(normalize_address_checked(&format!("0x{}", "1".repeat(65))).is_none());
    }

    #[test]
    fn test_normalization_is_idempotent_and_valid() {
        for input in ["0x2", "abc", "0x00ff", FULL_TWO] {
            let once = normalize_address_checked(input).unwrap();
            assert!(is_valid_address(&once));
            assert_eq!(normalize_address_checked(&once).unwrap(), once);
        }
    }

    #[test]
    fn test_normalize_address_short() {
        assert_eq!(normalize_address_short("0x2"), "0x2");
        assert_eq!(normalize_address_short(FULL_TWO), "0x2");
        assert_eq!(normalize_address_short("0x0"), "0x0");
    }

    #[test]
    fn test_parse_address() {
        let addr = parse_address("0x2").unwrap();
        assert_eq!(address_to_string(&addr), FULL_TWO);
        assert!(parse_address("not-hex").is_none());
    }
}
