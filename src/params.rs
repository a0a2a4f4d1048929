//! Typed access to a step's parameter object.
//!
//! Every getter reports failures as [`StepError::Validation`] naming the
//! parameter. `null` and empty strings count as absent.

use serde_json::{Map, Value};

use crate::error::{StepError, StepResult};
use sui_steps_transport::PageRequest;
use sui_steps_types::address::normalize_address_checked;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    values: Map<String, Value>,
}

impl Params {
    /// Wrap a parameter object. `null` yields an empty set.
    pub fn from_value(value: Value) -> StepResult<Self> {
        match value {
            Value::Object(values) => Ok(Self { values }),
            Value::Null => Ok(Self::default()),
            other => Err(StepError::validation(
                "parameters",
                format!("expected a JSON object, got {other}"),
            )),
        }
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        match self.values.get(name) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(v) => Some(v),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    fn missing(name: &str) -> StepError {
        StepError::validation(name, "is required")
    }

    pub fn str(&self, name: &str) -> StepResult<&str> {
        self.opt_str(name)?.ok_or_else(|| Self::missing(name))
    }

    pub fn opt_str(&self, name: &str) -> StepResult<Option<&str>> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.trim())),
            Some(other) => Err(StepError::validation(
                name,
                format!("expected a string, got {other}"),
            )),
        }
    }

    /// String parameter; numbers are accepted and rendered.
    pub fn string(&self, name: &str) -> StepResult<String> {
        match self.get(name) {
            None => Err(Self::missing(name)),
            Some(Value::String(s)) => Ok(s.trim().to_string()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(other) => Err(StepError::validation(
                name,
                format!("expected a string, got {other}"),
            )),
        }
    }

    pub fn opt_string(&self, name: &str) -> StepResult<Option<String>> {
        if self.contains(name) {
            self.string(name).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Sui address, normalized to `0x` + 64 hex digits.
    pub fn address(&self, name: &str) -> StepResult<String> {
        let raw = self.str(name)?;
        normalize_address_checked(raw)
            .ok_or_else(|| StepError::validation(name, format!("'{raw}' is not a valid Sui address")))
    }

    pub fn opt_address(&self, name: &str) -> StepResult<Option<String>> {
        if self.contains(name) {
            self.address(name).map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn object_id(&self, name: &str) -> StepResult<String> {
        let raw = self.str(name)?;
        normalize_address_checked(raw)
            .ok_or_else(|| StepError::validation(name, format!("'{raw}' is not a valid object id")))
    }

    /// List of object ids, each normalized.
    pub fn object_ids(&self, name: &str) -> StepResult<Vec<String>> {
        let items = self.list(name)?;
        if items.is_empty() {
            return Err(StepError::validation(name, "must not be empty"));
        }
        items
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                normalize_address_checked(raw).ok_or_else(|| {
                    StepError::validation(
                        format!("{name}[{i}]"),
                        format!("'{raw}' is not a valid object id"),
                    )
                })
            })
            .collect()
    }

    /// Non-empty string without surrounding whitespace, such as a digest.
    pub fn digest(&self, name: &str) -> StepResult<String> {
        let raw = self.str(name)?;
        if raw.chars().any(char::is_whitespace) {
            return Err(StepError::validation(name, "must not contain whitespace"));
        }
        Ok(raw.to_string())
    }

    /// Non-negative integer, given as a number or a decimal string.
    pub fn u64(&self, name: &str) -> StepResult<u64> {
        self.opt_u64(name)?.ok_or_else(|| Self::missing(name))
    }

    pub fn opt_u64(&self, name: &str) -> StepResult<Option<u64>> {
        let Some(value) = self.get(name) else {
            return Ok(None);
        };
        let parsed = match value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        parsed.map(Some).ok_or_else(|| {
            StepError::validation(name, format!("expected a non-negative integer, got {value}"))
        })
    }

    fn opt_i64(&self, name: &str) -> StepResult<Option<i64>> {
        let Some(value) = self.get(name) else {
            return Ok(None);
        };
        let parsed = match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        parsed
            .map(Some)
            .ok_or_else(|| StepError::validation(name, format!("expected an integer, got {value}")))
    }

    pub fn bool_or(&self, name: &str, default: bool) -> StepResult<bool> {
        match self.get(name) {
            None => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                other => Err(StepError::validation(
                    name,
                    format!("expected true or false, got '{other}'"),
                )),
            },
            Some(other) => Err(StepError::validation(
                name,
                format!("expected a boolean, got {other}"),
            )),
        }
    }

    /// JSON parameter: inline value, or a string holding JSON.
    pub fn json(&self, name: &str) -> StepResult<Value> {
        self.opt_json(name)?.ok_or_else(|| Self::missing(name))
    }

    pub fn opt_json(&self, name: &str) -> StepResult<Option<Value>> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::String(s)) => serde_json::from_str(s)
                .map(Some)
                .map_err(|e| StepError::validation(name, format!("malformed JSON: {e}"))),
            Some(v) => Ok(Some(v.clone())),
        }
    }

    /// List of strings: a JSON array, a string holding one, or comma-separated text.
    pub fn list(&self, name: &str) -> StepResult<Vec<String>> {
        let Some(value) = self.get(name) else {
            return Err(Self::missing(name));
        };
        let array = match value {
            Value::Array(items) => items.clone(),
            Value::String(s) if s.trim_start().starts_with('[') => {
                match serde_json::from_str::<Value>(s) {
                    Ok(Value::Array(items)) => items,
                    _ => return Err(StepError::validation(name, "malformed JSON array")),
                }
            }
            Value::String(s) => {
                return Ok(s
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect())
            }
            other => {
                return Err(StepError::validation(
                    name,
                    format!("expected a list, got {other}"),
                ))
            }
        };
        array
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::String(s) => Ok(s.trim().to_string()),
                Value::Number(n) => Ok(n.to_string()),
                other => Err(StepError::validation(
                    format!("{name}[{i}]"),
                    format!("expected a string, got {other}"),
                )),
            })
            .collect()
    }

    /// Cursor (verbatim) and bounded limit.
    pub fn page(&self) -> StepResult<PageRequest> {
        let cursor = self.get("cursor").cloned().unwrap_or(Value::Null);
        let limit = self.opt_i64("limit")?;
        PageRequest::new(cursor, limit).map_err(|m| StepError::validation("limit", m))
    }

    pub fn descending(&self) -> StepResult<bool> {
        self.bool_or("descending", false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(v: Value) -> Params {
        Params::from_value(v).unwrap()
    }

    #[test]
    fn test_absent_values() {
        let p = params(json!({"a": null, "b": "  ", "c": "x"}));
        assert!(!p.contains("a"));
        assert!(!p.contains("b"));
        assert!(p.contains("c"));
        assert!(matches!(
            p.str("a"),
            Err(StepError::Validation { ref parameter, ref message }) if parameter == "a" && message == "is required"
        ));
        assert!(Params::from_value(json!([1])).is_err());
        assert!(Params::from_value(Value::Null).unwrap().to_value() == json!({}));
    }

    #[test]
    fn test_address_normalized_and_validated() {
        let p = params(json!({"owner": "0x2", "bad": "0xZZ"}));
        assert_eq!(p.address("owner").unwrap(), format!("0x{:0>64}", "2"));
        let err = p.address("bad").unwrap_err();
        assert!(matches!(err, StepError::Validation { ref parameter, .. } if parameter == "bad"));
    }

    #[test]
    fn test_integers() {
        let p = params(json!({"n": 5, "s": "7", "neg": -1, "f": 1.5, "word": "ten"}));
        assert_eq!(p.u64("n").unwrap(), 5);
        assert_eq!(p.u64("s").unwrap(), 7);
        assert!(p.u64("neg").is_err());
        assert!(p.u64("f").is_err());
        assert!(p.u64("word").is_err());
        assert_eq!(p.opt_u64("missing").unwrap(), None);
    }

    #[test]
    fn test_json_param() {
        let p = params(json!({"inline": {"a": 1}, "text": "{\"b\": 2}", "broken": "{nope"}));
        assert_eq!(p.json("inline").unwrap(), json!({"a": 1}));
        assert_eq!(p.json("text").unwrap(), json!({"b": 2}));
        let err = p.json("broken").unwrap_err();
        assert!(err.to_string().contains("'broken'"));
        assert!(err.to_string().contains("malformed JSON"));
    }

    #[test]
    fn test_list_forms() {
        let p = params(json!({
            "arr": ["0x1", "0x2"],
            "text": "[\"a\", \"b\"]",
            "csv": "a, b ,,c",
            "mixed": ["a", {"x": 1}]
        }));
        assert_eq!(p.list("arr").unwrap(), vec!["0x1", "0x2"]);
        assert_eq!(p.list("text").unwrap(), vec!["a", "b"]);
        assert_eq!(p.list("csv").unwrap(), vec!["a", "b", "c"]);
        let err = p.list("mixed").unwrap_err();
        assert!(matches!(err, StepError::Validation { ref parameter, .. } if parameter == "mixed[1]"));
    }

    #[test]
    fn test_page_bounds_and_cursor_passthrough() {
        let cursor = json!({"txDigest": "abc", "eventSeq": "3"});
        let p = params(json!({"cursor": cursor, "limit": 10}));
        let page = p.page().unwrap();
        assert_eq!(page.cursor, cursor);
        assert_eq!(page.limit, 10);

        assert_eq!(params(json!({})).page().unwrap().limit, 50);
        for bad in [json!(0), json!(51), json!("many")] {
            let err = params(json!({ "limit": bad })).page().unwrap_err();
            assert!(matches!(err, StepError::Validation { ref parameter, .. } if parameter == "limit"));
        }
    }

    #[test]
    fn test_bools() {
        let p = params(json!({"t": true, "s": "FALSE", "bad": "maybe"}));
        assert!(p.bool_or("t", false).unwrap());
        assert!(!p.bool_or("s", true).unwrap());
        assert!(p.bool_or("missing", true).unwrap());
        assert!(p.bool_or("bad", false).is_err());
    }
}
