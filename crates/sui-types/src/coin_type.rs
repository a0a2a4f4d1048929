//! Coin type string helpers.
//!
//! Coin objects on Sui have the type `0x2::coin::Coin<T>` where `T` is the
//! coin type (`0x2::sui::SUI` for the native coin). These helpers convert
//! between the two forms and split generic parameters while respecting
//! nested angle brackets.

/// Fully-qualified type of the native SUI coin.
pub const SUI_COIN_TYPE: &str = "0x2::sui::SUI";

const COIN_WRAPPER_PREFIX: &str = "0x2::coin::Coin<";
const COIN_WRAPPER_PREFIX_LONG: &str =
    "0x0000000000000000000000000000000000000000000000000000000000000002::coin::Coin<";

/// Wrap a coin type into its coin object type.
///
/// # Examples
///
/// ```
/// use sui_steps_types::coin_type::build_coin_object_type;
///
/// assert_eq!(build_coin_object_type("0x2::sui::SUI"), "0x2::coin::Coin<0x2::sui::SUI>");
/// ```
pub fn build_coin_object_type(coin_type: &str) -> String {
    format!("{}{}>", COIN_WRAPPER_PREFIX, coin_type.trim())
}

/// Extract `T` from `0x2::coin::Coin<T>`.
///
/// Accepts both the short and the full-length framework address. Anything that
/// isn't a coin object type is returned unchanged (trimmed), so calling this on
/// a bare coin type is harmless.
///
/// # Examples
///
/// ```
/// use sui_steps_types::coin_type::{build_coin_object_type, extract_coin_type};
///
/// let t = "0xdba3::usdc::USDC";
/// assert_eq!(extract_coin_type(&build_coin_object_type(t)), t);
/// assert_eq!(extract_coin_type("0x2::sui::SUI"), "0x2::sui::SUI");
/// ```
pub fn extract_coin_type(object_type: &str) -> String {
    let trimmed = object_type.trim();
    let inner = trimmed
        .strip_prefix(COIN_WRAPPER_PREFIX)
        .or_else(|| trimmed.strip_prefix(COIN_WRAPPER_PREFIX_LONG))
        .and_then(|rest| rest.strip_suffix('>'));
    match inner {
        Some(inner) if brackets_balanced(inner) => inner.to_string(),
        _ => trimmed.to_string(),
    }
}

/// Whether `object_type` is a `0x2::coin::Coin<...>` type.
pub fn is_coin_object_type(object_type: &str) -> bool {
    let trimmed = object_type.trim();
    extract_coin_type(trimmed) != trimmed
}

fn brackets_balanced(s: &str) -> bool {
    let mut depth: i32 = 0;
    for c in s.chars() {
        match c {
            '<' => depth += 1,
            '>' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// Check that a coin type looks like `ADDR::module::Name` with optional generics.
///
/// This is a shape check only; it does not confirm the type exists on chain.
pub fn is_well_formed_coin_type(coin_type: &str) -> bool {
    let base = coin_type.split('<').next().unwrap_or("");
    let parts: Vec<&str> = base.split("::").collect();
    if parts.len() != 3 {
        return false;
    }
    let addr = parts[0].strip_prefix("0x").unwrap_or(parts[0]);
    let ident = |s: &str| {
        !s.is_empty()
            && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !s.starts_with(|c: char| c.is_ascii_digit())
    };
    !addr.is_empty()
        && addr.len() <= 64
        && addr.chars().all(|c| c.is_ascii_hexdigit())
        && ident(parts[1])
        && ident(parts[2])
        && brackets_balanced(coin_type)
}

/// Split type parameters respecting nested angle brackets.
///
/// Given "A, B<C, D>, E", returns ["A", "B<C, D>", "E"] by tracking bracket depth.
pub fn split_type_params(s: &str) -> Vec<&str> {
    let mut result = Vec::new();
    let mut depth = 0;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth -= 1,
            ',' if depth == 0 => {
                result.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }

    if start < s.len() {
        result.push(s[start..].trim());
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_coin_object_type() {
        assert_eq!(
            build_coin_object_type(SUI_COIN_TYPE),
            "0x2::coin::Coin<0x2::sui::SUI>"
        );
        assert_eq!(
            build_coin_object_type(" 0xabc::token::TOKEN "),
            "0x2::coin::Coin<0xabc::token::TOKEN>"
        );
    }

    #[test]
    fn test_extract_round_trip() {
        for t in [
            SUI_COIN_TYPE,
            "0xabc::token::TOKEN",
            "0x5d4b302506645c37ff133b98c4b50a5ae14841659738d6d733d59d0d217a93bf::coin::COIN",
            "0x1::lp::LP<0x2::sui::SUI, 0xabc::usdc::USDC>",
        ] {
            assert_eq!(extract_coin_type(&build_coin_object_type(t)), t);
        }
    }

    #[test]
    fn test_extract_long_form_and_passthrough() {
        let long = "0x0000000000000000000000000000000000000000000000000000000000000002::coin::Coin<0x2::sui::SUI>";
        assert_eq!(extract_coin_type(long), SUI_COIN_TYPE);
        assert_eq!(extract_coin_type("0x2::kiosk::Kiosk"), "0x2::kiosk::Kiosk");
        assert_eq!(extract_coin_type("0x2::coin::Coin<a>>"), "0x2::coin::Coin<a>>");
    }

    #[test]
    fn test_is_coin_object_type() {
        assert!(is_coin_object_type("0x2::coin::Coin<0x2::sui::SUI>"));
        assert!(!is_coin_object_type("0x2::sui::SUI"));
    }

    #[test]
    fn test_is_well_formed_coin_type() {
        assert!(is_well_formed_coin_type(SUI_COIN_TYPE));
        assert!(is_well_formed_coin_type("0x1::lp::LP<0x2::sui::SUI>"));
        assert!(!is_well_formed_coin_type("sui::SUI"));
        assert!(!is_well_formed_coin_type("0xzz::a::B"));
        assert!(!is_well_formed_coin_type("0x2::1bad::B"));
    }

    #[test]
    fn test_split_type_params() {
        let params = split_type_params("u64, 0x2::coin::Coin<0x2::sui::SUI>, bool");
        assert_eq!(params, vec!["u64", "0x2::coin::Coin<0x2::sui::SUI>", "bool"]);
    }
}
