//! Output records and result reshaping helpers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::OperationError;
use sui_steps_transport::Page;

/// One output record per input item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    pub success: bool,

    /// `resource.operation`
    pub operation: String,

    /// Index of the input item this record answers.
    pub item: usize,

    pub result: Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl StepRecord {
    pub fn ok(operation: impl Into<String>, item: usize, result: Value) -> Self {
        Self {
            success: true,
            operation: operation.into(),
            item,
            result,
            error: None,
            error_details: None,
            request_id: None,
            duration_ms: None,
        }
    }

    /// Error record emitted in place of a result under continue-on-fail.
    pub fn from_error(item: usize, err: &OperationError) -> Self {
        Self {
            success: false,
            operation: err.operation.clone(),
            item,
            result: serde_json::json!({ "error": err.to_string() }),
            error: Some(err.to_string()),
            error_details: Some(err.error.details()),
            request_id: None,
            duration_ms: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn is_error(&self) -> bool {
        !self.success
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Reshaped output: `fields` plus the untouched remote payload under `raw`.
pub fn with_raw(fields: Value, raw: Value) -> Value {
    let mut map = match fields {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    };
    map.insert("raw".to_string(), raw);
    Value::Object(map)
}

/// Listing output `{data, nextCursor, hasNextPage}`.
pub fn page_value(result: &Value) -> Value {
    Page::from_result(result).to_value()
}

/// Listing output with each entry reshaped by `map`; every entry keeps its
/// untouched payload under `raw`.
pub fn page_value_with(result: &Value, map: impl Fn(&Value) -> Value) -> Value {
    let mut page = Page::from_result(result);
    page.data = page
        .data
        .iter()
        .map(|entry| with_raw(map(entry), entry.clone()))
        .collect();
    page.to_value()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StepError;
    use serde_json::json;

    #[test]
    fn test_with_raw() {
        let out = with_raw(json!({"balance": "1"}), json!({"totalBalance": "1"}));
        assert_eq!(out["balance"], "1");
        assert_eq!(out["raw"]["totalBalance"], "1");
    }

    #[test]
    fn test_page_value_fills_missing_members() {
        assert_eq!(
            page_value(&json!({"data": [1]})),
            json!({"data": [1], "nextCursor": null, "hasNextPage": false})
        );
    }

    #[test]
    fn test_page_value_with_keeps_raw_entries() {
        let result = json!({
            "data": [{"data": {"objectId": "0xa", "version": "7"}}],
            "nextCursor": "0xa",
            "hasNextPage": true
        });
        let out = page_value_with(&result, |e| json!({"id": e.pointer("/data/objectId")}));
        assert_eq!(out["data"][0]["id"], "0xa");
        assert_eq!(out["data"][0]["raw"]["data"]["version"], "7");
        assert_eq!(out["nextCursor"], "0xa");
    }

    #[test]
    fn test_error_record() {
        let err = OperationError::new("coin.merge", StepError::signer_required());
        let record = StepRecord::from_error(3, &err);
        assert!(record.is_error());
        assert_eq!(record.item, 3);
        assert_eq!(record.result["error"], "coin.merge: signing key required");
        let json = record.to_json();
        assert_eq!(json["errorDetails"]["kind"], "precondition");
        assert!(json.get("durationMs").is_none());
    }
}
