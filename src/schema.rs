//! Declarative parameter schemas.
//!
//! Each operation lists its parameters once; the registry derives default
//! filling, required checks and the `operations` listing from that list.

use serde_json::{json, Value};

/// Value shape a parameter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    /// Sui address, normalized to 64 hex digits.
    Address,
    ObjectId,
    /// Base58 transaction digest.
    Digest,
    Integer,
    /// Human-decimal amount such as `"1.5"`.
    Decimal,
    Boolean,
    /// Free-form JSON (object or array), given inline or as a JSON string.
    Json,
    /// List of strings, given as an array, a JSON array string or comma-separated.
    List,
    /// Opaque pagination cursor, passed through verbatim.
    Cursor,
}

impl ParamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Address => "address",
            ParamKind::ObjectId => "objectId",
            ParamKind::Digest => "digest",
            ParamKind::Integer => "integer",
            ParamKind::Decimal => "decimal",
            ParamKind::Boolean => "boolean",
            ParamKind::Json => "json",
            ParamKind::List => "list",
            ParamKind::Cursor => "cursor",
        }
    }
}

/// Fallback for an omitted optional parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamDefault {
    None,
    Text(&'static str),
    Integer(i64),
    Boolean(bool),
    /// The signer's address, when a signer is configured.
    SignerAddress,
}

impl ParamDefault {
    /// Literal value, if this default is one.
    pub fn literal(&self) -> Option<Value> {
        match self {
            ParamDefault::Text(s) => Some(json!(s)),
            ParamDefault::Integer(i) => Some(json!(i)),
            ParamDefault::Boolean(b) => Some(json!(b)),
            ParamDefault::None | ParamDefault::SignerAddress => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub default: ParamDefault,
    pub description: &'static str,
}

impl ParamSpec {
    pub const fn required(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: true,
            default: ParamDefault::None,
            description,
        }
    }

    pub const fn optional(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: false,
            default: ParamDefault::None,
            description,
        }
    }

    pub const fn with_default(self, default: ParamDefault) -> Self {
        Self { default, ..self }
    }

    /// Optional parameter that falls back to the signer's address.
    pub const fn signer_address(name: &'static str, description: &'static str) -> Self {
        Self::optional(name, ParamKind::Address, description).with_default(ParamDefault::SignerAddress)
    }

    pub fn defaults_to_signer(&self) -> bool {
        matches!(self.default, ParamDefault::SignerAddress)
    }

    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "kind": self.kind.as_str(),
            "required": self.required,
            "default": self.default.literal(),
            "defaultsToSigner": self.defaults_to_signer(),
            "description": self.description,
        })
    }
}

/// Parameters shared by listing operations.
pub const CURSOR: ParamSpec = ParamSpec::optional(
    "cursor",
    ParamKind::Cursor,
    "Opaque cursor from a previous page's nextCursor",
);
pub const LIMIT: ParamSpec = ParamSpec::optional("limit", ParamKind::Integer, "Page size (1-50)")
    .with_default(ParamDefault::Integer(50));
pub const DESCENDING: ParamSpec = ParamSpec::optional(
    "descending",
    ParamKind::Boolean,
    "Return newest entries first",
)
.with_default(ParamDefault::Boolean(false));

/// Gas budget in MIST for transaction-building operations.
pub const GAS_BUDGET: ParamSpec = ParamSpec::optional(
    "gasBudget",
    ParamKind::Integer,
    "Gas budget in MIST",
)
.with_default(ParamDefault::Integer(10_000_000));
