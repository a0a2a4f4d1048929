//! Unit conversion, address and coin type helpers, plus a few network facts.
//!
//! The conversion and formatting operations run offline; they never touch
//! the session's transport.

use futures::future::BoxFuture;
use serde_json::{json, Value};

use crate::error::{StepError, StepResult};
use crate::params::Params;
use crate::registry::{Invocation, OperationDef};
use crate::response::with_raw;
use crate::schema::{ParamDefault, ParamKind, ParamSpec};
use sui_steps_transport::SuiRequest;
use sui_steps_types::address::{is_valid_address, normalize_address_checked, normalize_address_short};
use sui_steps_types::coin_type::{
    build_coin_object_type, extract_coin_type, is_coin_object_type, is_well_formed_coin_type,
};
use sui_steps_types::units::{
    format_balance, from_smallest_unit, parse_balance, parse_smallest_unit, to_smallest_unit,
    UnitError,
};

const RESOURCE: &str = "utility";

const DECIMALS: ParamSpec = ParamSpec::optional("decimals", ParamKind::Integer, "Coin decimals (SUI has 9)")
    .with_default(ParamDefault::Integer(9));

const TO_SMALLEST_UNIT: &[ParamSpec] = &[
    ParamSpec::required("amount", ParamKind::Decimal, "Human amount, e.g. 1.5"),
    DECIMALS,
];
const FROM_SMALLEST_UNIT: &[ParamSpec] = &[
    ParamSpec::required("amount", ParamKind::String, "Integer amount in the smallest unit"),
    DECIMALS,
];
const FORMAT_BALANCE: &[ParamSpec] = &[
    ParamSpec::required("amount", ParamKind::String, "Integer amount in the smallest unit"),
    DECIMALS,
    ParamSpec::optional("symbol", ParamKind::String, "Unit label appended to the result"),
];
const PARSE_BALANCE: &[ParamSpec] = &[
    ParamSpec::required("text", ParamKind::String, "Text such as \"1.5 SUI\""),
    DECIMALS,
];
const ADDRESS: &[ParamSpec] = &[ParamSpec::required("address", ParamKind::String, "Address to check")];
const BUILD_COIN_TYPE: &[ParamSpec] = &[ParamSpec::required("coinType", ParamKind::String, "Coin type, e.g. 0x2::sui::SUI")];
const EXTRACT_COIN_TYPE: &[ParamSpec] = &[ParamSpec::required(
    "objectType",
    ParamKind::String,
    "Coin object type, e.g. 0x2::coin::Coin<0x2::sui::SUI>",
)];
const GET_PROTOCOL_CONFIG: &[ParamSpec] = &[ParamSpec::optional(
    "version",
    ParamKind::Integer,
    "Protocol version; defaults to the latest",
)];

pub(crate) fn operations() -> Vec<OperationDef> {
    vec![
        OperationDef::new(
            RESOURCE,
            "toSmallestUnit",
            "Decimal amount to smallest-unit integer (truncating)",
            TO_SMALLEST_UNIT,
            to_smallest,
        ),
        OperationDef::new(
            RESOURCE,
            "fromSmallestUnit",
            "Smallest-unit integer to decimal amount",
            FROM_SMALLEST_UNIT,
            from_smallest,
        ),
        OperationDef::new(
            RESOURCE,
            "formatBalance",
            "Smallest-unit integer as a labelled decimal",
            FORMAT_BALANCE,
            format,
        ),
        OperationDef::new(
            RESOURCE,
            "parseBalance",
            "Labelled decimal text to smallest-unit integer",
            PARSE_BALANCE,
            parse,
        ),
        OperationDef::new(RESOURCE, "validateAddress", "Check an address", ADDRESS, validate_address),
        OperationDef::new(
            RESOURCE,
            "normalizeAddress",
            "Address in full 64-digit form",
            ADDRESS,
            normalize_address,
        ),
        OperationDef::new(
            RESOURCE,
            "buildCoinType",
            "Wrap a coin type in 0x2::coin::Coin<..>",
            BUILD_COIN_TYPE,
            build_coin_type,
        ),
        OperationDef::new(
            RESOURCE,
            "extractCoinType",
            "Coin type inside 0x2::coin::Coin<..>",
            EXTRACT_COIN_TYPE,
            extract,
        ),
        OperationDef::new(
            RESOURCE,
            "getReferenceGasPrice",
            "Reference gas price of the current epoch",
            &[],
            get_reference_gas_price,
        ),
        OperationDef::new(
            RESOURCE,
            "getProtocolConfig",
            "Protocol limits and feature flags",
            GET_PROTOCOL_CONFIG,
            get_protocol_config,
        ),
        OperationDef::new(RESOURCE, "getRpcVersion", "Version reported by the RPC node", &[], get_rpc_version),
    ]
}

/// Coin decimals fit in a `u8` on chain.
fn decimals(params: &Params) -> StepResult<u32> {
    let raw = params.u64("decimals")?;
    u8::try_from(raw)
        .map(u32::from)
        .map_err(|_| StepError::validation("decimals", format!("{raw} is out of range (0-255)")))
}

fn unit_error(name: &str) -> impl Fn(UnitError) -> StepError + '_ {
    move |e| StepError::validation(name, e.to_string())
}

fn to_smallest(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let amount = inv.params.string("amount")?;
        let decimals = decimals(&inv.params)?;
        let smallest = to_smallest_unit(&amount, decimals).map_err(unit_error("amount"))?;
        Ok(json!({
            "amount": amount,
            "decimals": decimals,
            "smallestUnit": smallest.to_string(),
        }))
    })
}

fn from_smallest(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let raw = inv.params.string("amount")?;
        let decimals = decimals(&inv.params)?;
        let smallest = parse_smallest_unit(&raw).map_err(unit_error("amount"))?;
        Ok(json!({
            "smallestUnit": smallest.to_string(),
            "decimals": decimals,
            "amount": from_smallest_unit(&smallest, decimals),
        }))
    })
}

fn format(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let raw = inv.params.string("amount")?;
        let decimals = decimals(&inv.params)?;
        let symbol = inv.params.opt_string("symbol")?;
        let smallest = parse_smallest_unit(&raw).map_err(unit_error("amount"))?;
        Ok(json!({
            "smallestUnit": smallest.to_string(),
            "formatted": format_balance(&smallest, decimals, symbol.as_deref()),
        }))
    })
}

fn parse(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let text = inv.params.string("text")?;
        let decimals = decimals(&inv.params)?;
        let smallest = parse_balance(&text, decimals).map_err(unit_error("text"))?;
        Ok(json!({
            "text": text,
            "decimals": decimals,
            "smallestUnit": smallest.to_string(),
        }))
    })
}

fn validate_address(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let address = inv.params.string("address")?;
        let normalized = normalize_address_checked(&address);
        Ok(json!({
            "address": address,
            "valid": normalized.is_some(),
            "fullLength": is_valid_address(&address),
            "normalized": normalized,
        }))
    })
}

fn normalize_address(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let address = inv.params.string("address")?;
        let normalized = normalize_address_checked(&address).ok_or_else(|| {
            StepError::validation("address", format!("'{address}' is not a valid Sui address"))
        })?;
        Ok(json!({
            "address": address,
            "normalized": normalized,
            "short": normalize_address_short(&normalized),
        }))
    })
}

fn build_coin_type(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let coin_type = inv.params.string("coinType")?;
        if !is_well_formed_coin_type(&coin_type) {
            return Err(StepError::validation(
                "coinType",
                format!("'{coin_type}' is not of the form 0xADDRESS::module::Name"),
            ));
        }
        Ok(json!({
            "coinType": coin_type,
            "objectType": build_coin_object_type(&coin_type),
        }))
    })
}

fn extract(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let object_type = inv.params.string("objectType")?;
        Ok(json!({
            "objectType": object_type,
            "coinType": extract_coin_type(&object_type),
            "isCoin": is_coin_object_type(&object_type),
        }))
    })
}

fn get_reference_gas_price(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let result = inv.session.call(&SuiRequest::GetReferenceGasPrice).await?;
        Ok(with_raw(json!({ "referenceGasPrice": result.clone() }), result))
    })
}

fn get_protocol_config(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let version = inv.params.opt_u64("version")?;
        inv.session.call(&SuiRequest::GetProtocolConfig { version }).await
    })
}

fn get_rpc_version(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let result = inv.session.call(&SuiRequest::RpcDiscover).await?;
        Ok(with_raw(
            json!({
                "version": result.pointer("/info/version").cloned().unwrap_or(Value::Null),
                "title": result.pointer("/info/title"),
            }),
            result,
        ))
    })
}
