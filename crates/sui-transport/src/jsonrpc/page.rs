//! Cursor pagination for listing methods.
//!
//! Listing methods return `{data, nextCursor, hasNextPage}`. The cursor is
//! opaque: whatever the node returned is handed back unchanged on the next call.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{RpcError, RpcTransport, SuiRequest};

/// Maximum items per page accepted by the node.
pub const MAX_PAGE_SIZE: u32 = 50;
/// Page size used when the caller gives none.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// One page of a listing result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub data: Vec<Value>,
    pub next_cursor: Value,
    pub has_next_page: bool,
}

impl Page {
    /// Parse a page from a listing `result`, tolerating missing members.
    pub fn from_result(result: &Value) -> Self {
        Self {
            data: result
                .get("data")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
            next_cursor: result.get("nextCursor").cloned().unwrap_or(Value::Null),
            has_next_page: result
                .get("hasNextPage")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "data": self.data,
            "nextCursor": self.next_cursor,
            "hasNextPage": self.has_next_page,
        })
    }
}

/// Validated cursor and limit for one listing call.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub cursor: Value,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            cursor: Value::Null,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Build a request; `limit` must be within `1..=MAX_PAGE_SIZE`.
    pub fn new(cursor: Value, limit: Option<i64>) -> Result<Self, String> {
        let limit = match limit {
            None => DEFAULT_PAGE_SIZE,
            Some(l) if l >= 1 && l <= MAX_PAGE_SIZE as i64 => l as u32,
            Some(l) => {
                return Err(format!(
                    "limit must be between 1 and {MAX_PAGE_SIZE}, got {l}"
                ))
            }
        };
        Ok(Self { cursor, limit })
    }
}

/// Follow `nextCursor` until `total_limit` items are collected or pages run out.
///
/// `make_request` receives the cursor and page size for each call.
pub async fn collect_pages<T, F>(
    transport: &T,
    total_limit: usize,
    mut make_request: F,
) -> Result<Vec<Value>, RpcError>
where
    T: RpcTransport + ?Sized,
    F: FnMut(Value, u32) -> SuiRequest,
{
    let mut collected = Vec::new();
    let mut cursor = Value::Null;

    while collected.len() < total_limit {
        let remaining = total_limit - collected.len();
        let page_size = remaining.min(MAX_PAGE_SIZE as usize) as u32;
        let request = make_request(cursor.clone(), page_size);
        let page = Page::from_result(&transport.call(&request).await?);

        if page.data.is_empty() {
            break;
        }
        collected.extend(page.data);

        if !page.has_next_page || page.next_cursor.is_null() {
            break;
        }
        cursor = page.next_cursor;
    }

    collected.truncate(total_limit);
    Ok(collected)
}
