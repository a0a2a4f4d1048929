//! Encoding utilities for hex and base64.
//!
//! Transaction bytes and signatures travel over JSON-RPC as standard base64;
//! raw private keys may arrive as hex or base64.

use base64::Engine;

/// Encode bytes to base64 string.
pub fn base64_encode(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Decode base64 string to bytes, returning None on failure.
pub fn try_base64_decode(b64: &str) -> Option<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .ok()
}

/// Decode key-like material that may be hex (`0x` optional) or base64.
///
/// Hex is tried first when the string only contains hex digits and has an even
/// length, since such strings are also (usually) valid base64.
pub fn decode_hex_or_base64(input: &str) -> Option<Vec<u8>> {
    let trimmed = input.trim();
    let stripped = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let looks_hex = !stripped.is_empty()
        && stripped.len() % 2 == 0
        && stripped.chars().all(|c| c.is_ascii_hexdigit());
    if looks_hex {
        if let Ok(bytes) = hex::decode(stripped) {
            return Some(bytes);
        }
    }
    try_base64_decode(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_roundtrip() {
        let original = b"hello world";
        let encoded = base64_encode(original);
        assert_eq!(try_base64_decode(&encoded).unwrap(), original);
        assert!(try_base64_decode("not-valid-base64!!!").is_none());
    }

    #[test]
    fn test_decode_hex_or_base64() {
        let key = [7u8; 32];
        assert_eq!(decode_hex_or_base64(&hex::encode(key)).unwrap(), key);
        assert_eq!(decode_hex_or_base64(&format!("0x{}", hex::encode(key))).unwrap(), key);
        assert_eq!(decode_hex_or_base64(&base64_encode(&key)).unwrap(), key);
        assert!(decode_hex_or_base64("!!!").is_none());
    }
}
