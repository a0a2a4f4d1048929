//! Smallest-unit <-> decimal conversion.
//!
//! On-chain balances are integers in the coin's smallest unit (MIST for SUI).
//! Human amounts are that integer scaled by `10^-decimals`. All conversions here
//! use integer arithmetic on [`BigUint`]; fractional smallest units are
//! truncated, never rounded.
//!
//! ```
//! use sui_steps_types::units::{from_smallest_unit, to_smallest_unit};
//!
//! let mist = to_smallest_unit("1.5", 9).unwrap();
//! assert_eq!(mist.to_string(), "1500000000");
//! assert_eq!(from_smallest_unit(&mist, 9), "1.500000000");
//! ```

use num_bigint::BigUint;
use thiserror::Error;

/// Decimals of the native SUI coin.
pub const SUI_DECIMALS: u32 = 9;

/// Errors from parsing a human or smallest-unit amount.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnitError {
    #[error("amount is empty")]
    Empty,
    #[error("amount must not be negative: {0}")]
    Negative(String),
    #[error("amount is not a decimal number: {0}")]
    NotNumeric(String),
    #[error("amount is not finite: {0}")]
    NotFinite(f64),
}

fn ten_pow(decimals: u32) -> BigUint {
    BigUint::from(10u32).pow(decimals)
}

fn parse_digits(digits: &str) -> BigUint {
    if digits.is_empty() {
        return BigUint::from(0u32);
    }
    // Caller guarantees ASCII digits only.
    BigUint::parse_bytes(digits.as_bytes(), 10).unwrap_or_default()
}

/// Convert a human decimal amount to the smallest unit: `floor(amount * 10^decimals)`.
///
/// Accepts `"1"`, `"0.5"`, `".5"`, `"1."` with surrounding whitespace. Rejects
/// empty input, negatives, exponents and anything that isn't a plain decimal.
pub fn to_smallest_unit(amount: &str, decimals: u32) -> Result<BigUint, UnitError> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(UnitError::Empty);
    }
    if trimmed.starts_with('-') {
        return Err(UnitError::Negative(trimmed.to_string()));
    }
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);

    let (whole, fraction) = match unsigned.split_once('.') {
        Some((w, f)) => (w, f),
        None => (unsigned, ""),
    };
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction) {
        return Err(UnitError::NotNumeric(trimmed.to_string()));
    }

    let scale = decimals as usize;
    let kept: String = if fraction.len() >= scale {
        fraction[..scale].to_string()
    } else {
        format!("{:0<width$}", fraction, width = scale)
    };

    Ok(parse_digits(whole) * ten_pow(decimals) + parse_digits(&kept))
}

/// Convert a native float amount; see [`to_smallest_unit`].
///
/// The float is rendered with Rust's shortest round-trip representation first,
/// so `0.1` converts as the literal `"0.1"` rather than its binary expansion.
pub fn to_smallest_unit_f64(amount: f64, decimals: u32) -> Result<BigUint, UnitError> {
    if !amount.is_finite() {
        return Err(UnitError::NotFinite(amount));
    }
    to_smallest_unit(&amount.to_string(), decimals)
}

/// Render a smallest-unit amount as a decimal string with exactly `decimals` places.
pub fn from_smallest_unit(amount: &BigUint, decimals: u32) -> String {
    let digits = amount.to_string();
    let scale = decimals as usize;
    if scale == 0 {
        return digits;
    }
    let padded = format!("{:0>width$}", digits, width = scale + 1);
    let (whole, fraction) = padded.split_at(padded.len() - scale);
    format!("{}.{}", whole, fraction)
}

/// Parse a smallest-unit integer given as a string (as the RPC returns balances).
pub fn parse_smallest_unit(amount: &str) -> Result<BigUint, UnitError> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(UnitError::Empty);
    }
    if trimmed.starts_with('-') {
        return Err(UnitError::Negative(trimmed.to_string()));
    }
    if !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(UnitError::NotNumeric(trimmed.to_string()));
    }
    Ok(parse_digits(trimmed))
}

/// [`from_smallest_unit`] followed by an optional ` SYMBOL` suffix.
///
/// ```
/// use num_bigint::BigUint;
/// use sui_steps_types::units::format_balance;
///
/// assert_eq!(format_balance(&BigUint::from(1_000_000u64), 6, Some("USDC")), "1.000000 USDC");
/// ```
pub fn format_balance(amount: &BigUint, decimals: u32, symbol: Option<&str>) -> String {
    let value = from_smallest_unit(amount, decimals);
    match symbol.map(str::trim).filter(|s| !s.is_empty()) {
        Some(symbol) => format!("{} {}", value, symbol),
        None => value,
    }
}

/// Parse text such as `"1.5 SUI"` by discarding everything but digits and `.`.
pub fn parse_balance(text: &str, decimals: u32) -> Result<BigUint, UnitError> {
    if text.trim_start().starts_with('-') {
        return Err(UnitError::Negative(text.trim().to_string()));
    }
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    to_smallest_unit(&cleaned, decimals)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big(n: u64) -> BigUint {
        BigUint::from(n)
    }

    #[test]
    fn test_to_smallest_unit_basics() {
        assert_eq!(to_smallest_unit("1", 9).unwrap(), big(1_000_000_000));
        assert_eq!(to_smallest_unit("0.5", 9).unwrap(), big(500_000_000));
        assert_eq!(to_smallest_unit("0", 9).unwrap(), big(0));
        assert_eq!(to_smallest_unit(".25", 2).unwrap(), big(25));
        assert_eq!(to_smallest_unit("7.", 0).unwrap(), big(7));
        assert_eq!(to_smallest_unit(" 42 ", 3).unwrap(), big(42_000));
    }

    #[test]
    fn test_to_smallest_unit_truncates() {
        assert_eq!(to_smallest_unit("1.9999999999", 9).unwrap(), big(1_999_999_999));
        assert_eq!(to_smallest_unit("0.129", 2).unwrap(), big(12));
        assert_eq!(to_smallest_unit("5.99", 0).unwrap(), big(5));
    }

    #[test]
    fn test_to_smallest_unit_rejects_bad_input() {
        assert_eq!(to_smallest_unit("", 9), Err(UnitError::Empty));
        assert!(matches!(to_smallest_unit("-1", 9), Err(UnitError::Negative(_))));
        assert!(matches!(to_smallest_unit("abc", 9), Err(UnitError::NotNumeric(_))));
        assert!(matches!(to_smallest_unit("1e9", 9), Err(UnitError::NotNumeric(_))));
        assert!(matches!(to_smallest_unit("1.2.3", 9), Err(UnitError::NotNumeric(_))));
        assert!(matches!(to_smallest_unit(".", 9), Err(UnitError::NotNumeric(_))));
    }

    #[test]
    fn test_to_smallest_unit_large_values() {
        let huge = "123456789012345678901234567890.123456789";
        let expected = BigUint::parse_bytes(b"123456789012345678901234567890123456789", 10).unwrap();
        assert_eq!(to_smallest_unit(huge, 9).unwrap(), expected);
        assert_eq!(from_smallest_unit(&expected, 9), huge);
    }

    #[test]
    fn test_to_smallest_unit_f64() {
        assert_eq!(to_smallest_unit_f64(0.1, 9).unwrap(), big(100_000_000));
        assert_eq!(to_smallest_unit_f64(1.5, 9).unwrap(), big(1_500_000_000));
        assert!(to_smallest_unit_f64(f64::NAN, 9).is_err());
        assert!(to_smallest_unit_f64(-0.5, 9).is_err());
    }

    #[test]
    fn test_from_smallest_unit() {
        assert_eq!(from_smallest_unit(&big(1_000_000_000), 9), "1.000000000");
        assert_eq!(from_smallest_unit(&big(0), 9), "0.000000000");
        assert_eq!(from_smallest_unit(&big(5), 9), "0.000000005");
        assert_eq!(from_smallest_unit(&big(1234), 0), "1234");
        assert_eq!(from_smallest_unit(&big(u64::MAX), 9), "18446744073.709551615");
    }

    #[test]
    fn test_round_trip_law() {
        for (x, d) in [
            ("0.000000000", 9),
            ("1.000000000", 9),
            ("0.500000000", 9),
            ("123.456000", 6),
            ("99", 0),
            ("0.01", 2),
        ] {
            let smallest = to_smallest_unit(x, d).unwrap();
            assert_eq!(from_smallest_unit(&smallest, d), x, "round trip of {x} at {d}");
        }
    }

    #[test]
    fn test_parse_smallest_unit() {
        assert_eq!(parse_smallest_unit("1000").unwrap(), big(1000));
        assert!(parse_smallest_unit("1.5").is_err());
        assert!(parse_smallest_unit("-3").is_err());
        assert!(parse_smallest_unit("").is_err());
    }

    #[test]
    fn test_format_balance() {
        assert_eq!(format_balance(&big(1_000_000), 6, Some("USDC")), "1.000000 USDC");
        assert_eq!(format_balance(&big(1_000_000), 6, None), "1.000000");
        assert_eq!(format_balance(&big(1_000_000), 6, Some("  ")), "1.000000");
    }

    #[test]
    fn test_parse_balance() {
        assert_eq!(
            parse_balance("1.5 SUI", 9).unwrap(),
            to_smallest_unit("1.5", 9).unwrap()
        );
        assert_eq!(parse_balance("$2.25", 2).unwrap(), big(225));
        assert!(parse_balance("-1 SUI", 9).is_err());
        assert!(parse_balance("SUI", 9).is_err());
    }
}
