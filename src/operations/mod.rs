//! Operation handlers, one module per resource.
//!
//! Each module exposes `operations()` returning its catalog rows; the
//! registry concatenates them. Handlers read typed parameters, issue one
//! request (or a build/sign/submit sequence) and reshape the result.

pub(crate) mod account;
pub(crate) mod checkpoint;
pub(crate) mod coin;
pub(crate) mod contract;
pub(crate) mod defi;
pub(crate) mod event;
pub(crate) mod move_module;
pub(crate) mod name_service;
pub(crate) mod nft;
pub(crate) mod object;
pub(crate) mod ptb;
pub(crate) mod staking;
pub(crate) mod transaction;
pub(crate) mod utility;

use move_core_types::account_address::AccountAddress;
use serde_json::{json, Value};

use crate::error::{StepError, StepResult};
use crate::params::Params;
use crate::registry::OperationDef;
use crate::response::with_raw;
use crate::session::Session;
use crate::tx::GasConfig;
use sui_steps_transport::{lookup, Lookup, SuiRequest};
use sui_steps_types::address::parse_address;
use sui_steps_types::units::{to_smallest_unit, SUI_DECIMALS};

pub(crate) fn all() -> Vec<OperationDef> {
    [
        account::operations(),
        transaction::operations(),
        coin::operations(),
        object::operations(),
        nft::operations(),
        move_module::operations(),
        contract::operations(),
        staking::operations(),
        defi::operations(),
        checkpoint::operations(),
        event::operations(),
        name_service::operations(),
        ptb::operations(),
        utility::operations(),
    ]
    .concat()
}

/// Address parameter as an `AccountAddress`.
pub(crate) fn account_address(params: &Params, name: &str) -> StepResult<AccountAddress> {
    let normalized = params.address(name)?;
    parse_address(&normalized)
        .ok_or_else(|| StepError::validation(name, format!("'{normalized}' is not a valid Sui address")))
}

/// `gasBudget` and optional `gasPrice`.
pub(crate) fn gas_config(params: &Params) -> StepResult<GasConfig> {
    let budget = params.u64("gasBudget")?;
    if budget == 0 {
        return Err(StepError::validation("gasBudget", "must be greater than zero"));
    }
    Ok(GasConfig {
        budget,
        price: params.opt_u64("gasPrice")?,
    })
}

/// Human SUI amount (e.g. `"1.5"`) converted to MIST.
pub(crate) fn sui_amount(params: &Params, name: &str) -> StepResult<u64> {
    let text = params.string(name)?;
    let mist = to_smallest_unit(&text, SUI_DECIMALS)
        .map_err(|e| StepError::validation(name, e.to_string()))?;
    let mist = u64::try_from(&mist)
        .map_err(|_| StepError::validation(name, format!("{text} SUI does not fit in a u64 of MIST")))?;
    if mist == 0 {
        return Err(StepError::validation(name, "must be greater than zero"));
    }
    Ok(mist)
}

/// Smallest-unit integer list, each entry validated.
pub(crate) fn unit_amounts(params: &Params, name: &str) -> StepResult<Vec<u64>> {
    let items = params.list(name)?;
    if items.is_empty() {
        return Err(StepError::validation(name, "must not be empty"));
    }
    items
        .iter()
        .enumerate()
        .map(|(i, raw)| match raw.parse::<u64>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(StepError::validation(
                format!("{name}[{i}]"),
                format!("expected a positive integer amount, got '{raw}'"),
            )),
        })
        .collect()
}

/// Fetch one object; a missing or deleted object is `NotFound`.
pub(crate) async fn fetch_object(session: &Session, object_id: &str, options: Value) -> StepResult<Value> {
    let outcome = session
        .transport()
        .call(&SuiRequest::GetObject {
            object_id: object_id.to_string(),
            options,
        })
        .await;
    match lookup(outcome)? {
        Lookup::Found(result) => match Lookup::from_object_response(result) {
            Lookup::Found(result) => Ok(result),
            Lookup::NotFound => Err(StepError::not_found(format!("object {object_id}"))),
        },
        Lookup::NotFound => Err(StepError::not_found(format!("object {object_id}"))),
    }
}

/// A remote lookup whose absence is an error naming `what`.
pub(crate) async fn fetch_required(session: &Session, request: &SuiRequest, what: String) -> StepResult<Value> {
    match lookup(session.transport().call(request).await)? {
        Lookup::Found(result) => Ok(result),
        Lookup::NotFound => Err(StepError::not_found(what)),
    }
}

/// Summary of an executed transaction block.
pub(crate) fn transaction_output(result: Value) -> Value {
    let effects = result.get("effects");
    let fields = json!({
        "digest": result.get("digest"),
        "status": effects.and_then(|e| e.pointer("/status/status")),
        "error": effects.and_then(|e| e.pointer("/status/error")),
        "gasUsed": effects.and_then(|e| e.get("gasUsed")),
        "objectChanges": result.get("objectChanges"),
        "balanceChanges": result.get("balanceChanges"),
        "events": result.get("events"),
        "checkpoint": result.get("checkpoint"),
        "timestampMs": result.get("timestampMs"),
    });
    with_raw(fields, result)
}

/// Object summary shared by object, nft and defi lookups.
pub(crate) fn object_summary(result: &Value) -> Value {
    let data = result.get("data").unwrap_or(&Value::Null);
    json!({
        "objectId": data.get("objectId"),
        "version": data.get("version"),
        "digest": data.get("digest"),
        "type": data.get("type"),
        "owner": data.get("owner"),
        "previousTransaction": data.get("previousTransaction"),
        "fields": data.pointer("/content/fields"),
        "display": data.pointer("/display/data"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sui_amount() {
        let p = Params::from_value(json!({"a": "1.5", "b": "0", "c": "-1", "d": 2})).unwrap();
        assert_eq!(sui_amount(&p, "a").unwrap(), 1_500_000_000);
        assert!(sui_amount(&p, "b").is_err());
        assert!(sui_amount(&p, "c").is_err());
        assert_eq!(sui_amount(&p, "d").unwrap(), 2_000_000_000);
    }

    #[test]
    fn test_unit_amounts() {
        let p = Params::from_value(json!({"ok": [1, "2"], "bad": ["1", "x"]})).unwrap();
        assert_eq!(unit_amounts(&p, "ok").unwrap(), vec![1, 2]);
        assert!(matches!(
            unit_amounts(&p, "bad"),
            Err(StepError::Validation { ref parameter, .. }) if parameter == "bad[1]"
        ));
    }

    #[test]
    fn test_gas_config_rejects_zero() {
        let p = Params::from_value(json!({"gasBudget": 0})).unwrap();
        assert!(gas_config(&p).is_err());
        let p = Params::from_value(json!({"gasBudget": "5000", "gasPrice": 750})).unwrap();
        assert_eq!(
            gas_config(&p).unwrap(),
            GasConfig {
                budget: 5000,
                price: Some(750)
            }
        );
    }

    #[test]
    fn test_transaction_output_keeps_raw() {
        let raw = json!({
            "digest": "D",
            "effects": {"status": {"status": "success"}, "gasUsed": {"computationCost": "1"}}
        });
        let out = transaction_output(raw.clone());
        assert_eq!(out["digest"], "D");
        assert_eq!(out["status"], "success");
        assert!(out["error"].is_null());
        assert_eq!(out["raw"], raw);
    }
}
