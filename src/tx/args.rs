//! Explicitly tagged Move call arguments.
//!
//! Every argument is an object `{"type": <tag>, "value": ...}`. Nothing is
//! inferred from the shape of the value: a hex string is an object only when
//! tagged `object`, an address only when tagged `address`, and plain text
//! when tagged `string`.
//!
//! | tag | value |
//! |-----|-------|
//! | `object` | object id; optional `"mutable": false` |
//! | `u8` .. `u256` | number or decimal string |
//! | `bool` | boolean or `"true"`/`"false"` |
//! | `address` | hex address |
//! | `string` | UTF-8 text |
//! | `vector<u8>` | array of bytes or `0x` hex string |
//! | `vector<u64>` | array of numbers or decimal strings |
//! | `vector<address>` | array of hex addresses |
//! | `result` | `"index": n` |
//! | `nestedResult` | `"index": n, "resultIndex": m` |
//! | `input` | `"index": n` (plan-level inputs only) |
//! | `gas` | none |

use move_core_types::account_address::AccountAddress;
use num_bigint::BigUint;
use serde_json::Value;

use crate::error::{StepError, StepResult};
use crate::tx::plan::{PlanArg, PlanBuilder};
use sui_steps_types::address::{normalize_address_checked, parse_address};

pub const ARG_TAGS: &[&str] = &[
    "object",
    "u8",
    "u16",
    "u32",
    "u64",
    "u128",
    "u256",
    "bool",
    "address",
    "string",
    "vector<u8>",
    "vector<u64>",
    "vector<address>",
    "result",
    "nestedResult",
    "input",
    "gas",
];

/// A parsed argument, not yet placed in a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaggedArg {
    Object { id: String, mutable: bool },
    /// BCS bytes of a pure value.
    Pure(Vec<u8>),
    Input(u16),
    Result(u16),
    NestedResult(u16, u16),
    Gas,
}

impl TaggedArg {
    /// Place the argument in `builder`, adding an input when needed.
    pub fn into_plan_arg(self, builder: &mut PlanBuilder) -> StepResult<PlanArg> {
        match self {
            TaggedArg::Object { id, mutable } => builder.object(&id, mutable),
            TaggedArg::Pure(bytes) => builder.pure_bytes(bytes),
            TaggedArg::Input(i) => Ok(PlanArg::Input(i)),
            TaggedArg::Result(i) => Ok(PlanArg::Result(i)),
            TaggedArg::NestedResult(i, j) => Ok(PlanArg::NestedResult(i, j)),
            TaggedArg::Gas => Ok(PlanArg::GasCoin),
        }
    }
}

/// Parse every element of a JSON array; errors name `{label}[i]`.
pub fn parse_tagged_args(values: &[Value], label: &str) -> StepResult<Vec<TaggedArg>> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| parse_tagged_arg(v, &format!("{label}[{i}]")))
        .collect()
}

/// Parse one tagged argument. `label` names it in errors, e.g. `arguments[2]`.
pub fn parse_tagged_arg(value: &Value, label: &str) -> StepResult<TaggedArg> {
    let invalid = |message: String| StepError::validation(label, message);

    let Some(obj) = value.as_object() else {
        return Err(invalid(format!(
            "argument {value} has no type tag; use {{\"type\": <tag>, \"value\": ...}} with one of: {}",
            ARG_TAGS.join(", ")
        )));
    };
    let Some(tag) = obj.get("type").and_then(Value::as_str) else {
        return Err(invalid(format!(
            "argument has no type tag; expected one of: {}",
            ARG_TAGS.join(", ")
        )));
    };
    let inner = obj.get("value").unwrap_or(&Value::Null);
    let index = |key: &str| -> StepResult<u16> {
        obj.get(key)
            .and_then(Value::as_u64)
            .and_then(|n| u16::try_from(n).ok())
            .ok_or_else(|| invalid(format!("'{tag}' argument needs an integer '{key}'")))
    };
    let encode = |bytes: Result<Vec<u8>, bcs::Error>| bytes.map(TaggedArg::Pure).map_err(StepError::build);

    match tag {
        "object" => {
            let raw = inner
                .as_str()
                .ok_or_else(|| invalid("object argument needs an object id string".into()))?;
            let id = normalize_address_checked(raw)
                .ok_or_else(|| invalid(format!("'{raw}' is not a valid object id")))?;
            let mutable = obj.get("mutable").and_then(Value::as_bool).unwrap_or(true);
            Ok(TaggedArg::Object { id, mutable })
        }
        "u8" => encode(bcs::to_bytes(&unsigned::<u8>(inner, tag).map_err(invalid)?)),
        "u16" => encode(bcs::to_bytes(&unsigned::<u16>(inner, tag).map_err(invalid)?)),
        "u32" => encode(bcs::to_bytes(&unsigned::<u32>(inner, tag).map_err(invalid)?)),
        "u64" => encode(bcs::to_bytes(&unsigned::<u64>(inner, tag).map_err(invalid)?)),
        "u128" => encode(bcs::to_bytes(&unsigned::<u128>(inner, tag).map_err(invalid)?)),
        "u256" => Ok(TaggedArg::Pure(u256_le_bytes(inner).map_err(invalid)?.to_vec())),
        "bool" => {
            let b = match inner {
                Value::Bool(b) => *b,
                Value::String(s) if s == "true" => true,
                Value::String(s) if s == "false" => false,
                other => return Err(invalid(format!("expected a bool, got {other}"))),
            };
            encode(bcs::to_bytes(&b))
        }
        "address" => encode(bcs::to_bytes(&address(inner).map_err(invalid)?)),
        "string" => {
            let s = inner
                .as_str()
                .ok_or_else(|| invalid(format!("expected a string, got {inner}")))?;
            encode(bcs::to_bytes(s))
        }
        "vector<u8>" => {
            let bytes: Vec<u8> = match inner {
                Value::String(s) => {
                    let hex_str = s.strip_prefix("0x").unwrap_or(s);
                    hex::decode(hex_str)
                        .map_err(|e| invalid(format!("vector<u8> hex string is invalid: {e}")))?
                }
                Value::Array(items) => items
                    .iter()
                    .map(|v| unsigned::<u8>(v, "u8"))
                    .collect::<Result<_, _>>()
                    .map_err(invalid)?,
                other => return Err(invalid(format!("expected a byte array or hex string, got {other}"))),
            };
            encode(bcs::to_bytes(&bytes))
        }
        "vector<u64>" => {
            let items = inner
                .as_array()
                .ok_or_else(|| invalid(format!("expected an array, got {inner}")))?;
            let values: Vec<u64> = items
                .iter()
                .map(|v| unsigned::<u64>(v, "u64"))
                .collect::<Result<_, _>>()
                .map_err(invalid)?;
            encode(bcs::to_bytes(&values))
        }
        "vector<address>" => {
            let items = inner
                .as_array()
                .ok_or_else(|| invalid(format!("expected an array, got {inner}")))?;
            let values: Vec<AccountAddress> = items
                .iter()
                .map(address)
                .collect::<Result<_, _>>()
                .map_err(invalid)?;
            encode(bcs::to_bytes(&values))
        }
        "result" => Ok(TaggedArg::Result(index("index")?)),
        "nestedResult" => Ok(TaggedArg::NestedResult(index("index")?, index("resultIndex")?)),
        "input" => Ok(TaggedArg::Input(index("index")?)),
        "gas" => Ok(TaggedArg::Gas),
        other => Err(invalid(format!(
            "unknown type tag '{other}'; expected one of: {}",
            ARG_TAGS.join(", ")
        ))),
    }
}

fn unsigned<T>(value: &Value, tag: &str) -> Result<T, String>
where
    T: std::str::FromStr + TryFrom<u64>,
{
    let parsed = match value {
        Value::Number(n) => n.as_u64().and_then(|n| T::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<T>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| format!("{value} is not a valid {tag}"))
}

fn address(value: &Value) -> Result<AccountAddress, String> {
    value
        .as_str()
        .and_then(parse_address)
        .ok_or_else(|| format!("{value} is not a valid address"))
}

/// Little-endian 32-byte encoding of a u256, which is its BCS form.
fn u256_le_bytes(value: &Value) -> Result<[u8; 32], String> {
    let text = match value {
        Value::Number(n) if n.is_u64() => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        other => return Err(format!("{other} is not a valid u256")),
    };
    let n = text
        .parse::<BigUint>()
        .map_err(|_| format!("'{text}' is not a valid u256"))?;
    let le = n.to_bytes_le();
    if le.len() > 32 {
        return Err(format!("'{text}' does not fit in u256"));
    }
    let mut out = [0u8; 32];
    out[..le.len()].copy_from_slice(&le);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pure(v: Value) -> Vec<u8> {
        match parse_tagged_arg(&v, "arguments[0]").unwrap() {
            TaggedArg::Pure(bytes) => bytes,
            other => panic!("expected pure, got {other:?}"),
        }
    }

    #[test]
    fn test_untagged_arguments_rejected() {
        for v in [json!("0x2"), json!(5), json!({"value": 1})] {
            let err = parse_tagged_arg(&v, "arguments[1]").unwrap_err();
            assert!(
                matches!(err, StepError::Validation { ref parameter, .. } if parameter == "arguments[1]"),
                "{v}: {err:?}"
            );
        }
        let err = parse_tagged_arg(&json!({"type": "u7", "value": 1}), "arguments[0]").unwrap_err();
        assert!(err.to_string().contains("unknown type tag"));
    }

    #[test]
    fn test_integer_encodings() {
        assert_eq!(pure(json!({"type": "u8", "value": 255})), vec![255]);
        assert!(parse_tagged_arg(&json!({"type": "u8", "value": 256}), "a").is_err());
        assert_eq!(pure(json!({"type": "u16", "value": "513"})), vec![1, 2]);
        assert_eq!(pure(json!({"type": "u64", "value": 1})), 1u64.to_le_bytes().to_vec());
        assert_eq!(
            pure(json!({"type": "u128", "value": "340282366920938463463374607431768211455"})),
            vec![0xff; 16]
        );
        let u256 = pure(json!({"type": "u256", "value": "256"}));
        assert_eq!(u256.len(), 32);
        assert_eq!(&u256[..2], &[0, 1]);
        assert!(parse_tagged_arg(&json!({"type": "u64", "value": -1}), "a").is_err());
    }

    #[test]
    fn test_address_versus_string() {
        let addr = pure(json!({"type": "address", "value": "0x2"}));
        assert_eq!(addr.len(), 32);
        assert_eq!(addr[31], 2);
        // The same text tagged as a string is encoded as text.
        let text = pure(json!({"type": "string", "value": "0x2"}));
        assert_eq!(text, vec![3, b'0', b'x', b'2']);
    }

    #[test]
    fn test_vectors_and_bool() {
        assert_eq!(pure(json!({"type": "vector<u8>", "value": "0x0102"})), vec![2, 1, 2]);
        assert_eq!(pure(json!({"type": "vector<u8>", "value": [7]})), vec![1, 7]);
        let v = pure(json!({"type": "vector<u64>", "value": [1, "2"]}));
        assert_eq!(v.len(), 1 + 16);
        let addrs = pure(json!({"type": "vector<address>", "value": ["0x1", "0x2"]}));
        assert_eq!(addrs.len(), 1 + 64);
        assert_eq!(pure(json!({"type": "bool", "value": true})), vec![1]);
        assert_eq!(pure(json!({"type": "bool", "value": "false"})), vec![0]);
    }

    #[test]
    fn test_references_and_objects() {
        assert_eq!(
            parse_tagged_arg(&json!({"type": "nestedResult", "index": 1, "resultIndex": 0}), "a").unwrap(),
            TaggedArg::NestedResult(1, 0)
        );
        assert_eq!(parse_tagged_arg(&json!({"type": "gas"}), "a").unwrap(), TaggedArg::Gas);
        assert!(parse_tagged_arg(&json!({"type": "result"}), "a").is_err());

        let obj = parse_tagged_arg(&json!({"type": "object", "value": "0x5", "mutable": false}), "a").unwrap();
        assert_eq!(
            obj,
            TaggedArg::Object {
                id: format!("0x{:0>64}", "5"),
                mutable: false
            }
        );
    }

    #[test]
    fn test_parse_list_labels() {
        let err = parse_tagged_args(&[json!({"type": "gas"}), json!(3)], "arguments").unwrap_err();
        assert!(matches!(err, StepError::Validation { ref parameter, .. } if parameter == "arguments[1]"));
    }
}
