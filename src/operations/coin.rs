use futures::future::BoxFuture;
use num_bigint::BigUint;
use serde_json::{json, Value};

use super::{account_address, fetch_required, gas_config, transaction_output, unit_amounts};
use crate::error::{StepError, StepResult};
use crate::registry::{Invocation, OperationDef};
use crate::response::{page_value, with_raw};
use crate::schema::{ParamDefault, ParamKind, ParamSpec, CURSOR, GAS_BUDGET, LIMIT};
use crate::session::Session;
use crate::tx::builders::{self, CoinSource, Transfer};
use crate::tx::execute;
use crate::tx::lower::MAX_GAS_COINS;
use sui_steps_transport::jsonrpc::collect_pages;
use sui_steps_transport::SuiRequest;
use sui_steps_types::address::{normalize_address_checked, parse_address};
use sui_steps_types::units::parse_smallest_unit;
use sui_steps_types::SUI_COIN_TYPE;

const RESOURCE: &str = "coin";

const OWNER: ParamSpec = ParamSpec::signer_address("owner", "Coin owner; defaults to the signer");
const COIN_TYPE: ParamSpec = ParamSpec::optional("coinType", ParamKind::String, "Coin type")
    .with_default(ParamDefault::Text(SUI_COIN_TYPE));
const COIN_TYPE_REQUIRED: ParamSpec =
    ParamSpec::required("coinType", ParamKind::String, "Coin type, e.g. 0x2::sui::SUI");

const GET_COINS: &[ParamSpec] = &[OWNER, COIN_TYPE, CURSOR, LIMIT];
const GET_ALL_COINS: &[ParamSpec] = &[OWNER, CURSOR, LIMIT];
const GET_METADATA: &[ParamSpec] = &[COIN_TYPE_REQUIRED];
const GET_TOTAL_SUPPLY: &[ParamSpec] = &[COIN_TYPE_REQUIRED];
const MULTI_TRANSFER: &[ParamSpec] = &[
    ParamSpec::required(
        "recipients",
        ParamKind::Json,
        "Array of {\"address\": \"0x...\", \"amount\": \"<smallest units>\"}",
    ),
    COIN_TYPE,
    GAS_BUDGET,
];
const DRAIN_ALL: &[ParamSpec] = &[
    ParamSpec::required("recipient", ParamKind::Address, "Receives every SUI coin"),
    GAS_BUDGET,
];
const MERGE: &[ParamSpec] = &[
    ParamSpec::required("destinationCoinId", ParamKind::ObjectId, "Coin that receives the balance"),
    ParamSpec::required("sourceCoinIds", ParamKind::List, "Coins merged into the destination"),
    GAS_BUDGET,
];
const SPLIT: &[ParamSpec] = &[
    ParamSpec::optional(
        "coinObjectId",
        ParamKind::ObjectId,
        "Coin to split; the gas coin when omitted",
    ),
    ParamSpec::required("amounts", ParamKind::List, "Amounts of the new coins, in smallest units"),
    ParamSpec::signer_address("recipient", "Receives the new coins; defaults to the signer"),
    GAS_BUDGET,
];

pub(crate) fn operations() -> Vec<OperationDef> {
    vec![
        OperationDef::new(RESOURCE, "getCoins", "Coins of one type owned by an address", GET_COINS, get_coins),
        OperationDef::new(RESOURCE, "getAllCoins", "Coins of every type owned by an address", GET_ALL_COINS, get_all_coins),
        OperationDef::new(RESOURCE, "getMetadata", "Coin metadata (decimals, symbol, name)", GET_METADATA, get_metadata),
        OperationDef::new(RESOURCE, "getTotalSupply", "Total supply of a coin type", GET_TOTAL_SUPPLY, get_total_supply),
        OperationDef::new(
            RESOURCE,
            "multiTransfer",
            "Pay several recipients in one transaction",
            MULTI_TRANSFER,
            multi_transfer,
        )
        .requires_signer(),
        OperationDef::new(RESOURCE, "drainAll", "Send every SUI coin to one address", DRAIN_ALL, drain_all)
            .requires_signer(),
        OperationDef::new(RESOURCE, "merge", "Merge coins into one", MERGE, merge).requires_signer(),
        OperationDef::new(RESOURCE, "split", "Split a coin into new coins", SPLIT, split).requires_signer(),
    ]
}

fn get_coins(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let owner = inv.params.address("owner")?;
        let coin_type = inv.params.string("coinType")?;
        let page = inv.params.page()?;
        let result = inv
            .session
            .call(&SuiRequest::GetCoins {
                owner,
                coin_type: Some(coin_type),
                cursor: page.cursor,
                limit: Some(page.limit),
            })
            .await?;
        Ok(page_value(&result))
    })
}

fn get_all_coins(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let owner = inv.params.address("owner")?;
        let page = inv.params.page()?;
        let result = inv
            .session
            .call(&SuiRequest::GetAllCoins {
                owner,
                cursor: page.cursor,
                limit: Some(page.limit),
            })
            .await?;
        Ok(page_value(&result))
    })
}

fn get_metadata(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let coin_type = inv.params.string("coinType")?;
        fetch_required(
            inv.session,
            &SuiRequest::GetCoinMetadata {
                coin_type: coin_type.clone(),
            },
            format!("metadata for {coin_type}"),
        )
        .await
    })
}

fn get_total_supply(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let coin_type = inv.params.string("coinType")?;
        let result = inv
            .session
            .call(&SuiRequest::GetTotalSupply {
                coin_type: coin_type.clone(),
            })
            .await?;
        Ok(with_raw(
            json!({ "coinType": coin_type, "totalSupply": result.get("value") }),
            result,
        ))
    })
}

/// Parse `[{address, amount}]` into transfers; errors name `recipients[i].field`.
fn parse_recipients(value: &Value) -> StepResult<Vec<Transfer>> {
    let Some(items) = value.as_array().filter(|items| !items.is_empty()) else {
        return Err(StepError::validation("recipients", "expected a non-empty array"));
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let raw_address = item.get("address").and_then(Value::as_str).unwrap_or("");
            let recipient = normalize_address_checked(raw_address)
                .and_then(|a| parse_address(&a))
                .ok_or_else(|| {
                    StepError::validation(
                        format!("recipients[{i}].address"),
                        format!("'{raw_address}' is not a valid Sui address"),
                    )
                })?;
            let amount = match item.get("amount") {
                Some(Value::Number(n)) => n.as_u64(),
                Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
                _ => None,
            }
            .filter(|a| *a > 0)
            .ok_or_else(|| {
                StepError::validation(
                    format!("recipients[{i}].amount"),
                    "expected a positive integer amount in smallest units",
                )
            })?;
            Ok(Transfer { recipient, amount })
        })
        .collect()
}

/// Every coin of `coin_type` owned by `owner` as `(id, balance)`.
async fn owned_coins(session: &Session, owner: &str, coin_type: &str) -> StepResult<Vec<(String, BigUint)>> {
    let coins = collect_pages(session.transport(), MAX_GAS_COINS, |cursor, limit| {
        SuiRequest::GetCoins {
            owner: owner.to_string(),
            coin_type: Some(coin_type.to_string()),
            cursor,
            limit: Some(limit),
        }
    })
    .await?;
    Ok(coins
        .iter()
        .filter_map(|coin| {
            let id = coin.get("coinObjectId")?.as_str()?.to_string();
            let balance = coin
                .get("balance")
                .and_then(Value::as_str)
                .and_then(|b| parse_smallest_unit(b).ok())
                .unwrap_or_default();
            Some((id, balance))
        })
        .collect())
}

fn multi_transfer(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let transfers = parse_recipients(&inv.params.json("recipients")?)?;
        let coin_type = inv.params.string("coinType")?;
        let gas = gas_config(&inv.params)?;

        let source = if coin_type == SUI_COIN_TYPE {
            CoinSource::Gas
        } else {
            let owner = inv.session.require_signer()?.address_string();
            let coins = owned_coins(inv.session, &owner, &coin_type).await?;
            let needed: BigUint = transfers.iter().map(|t| BigUint::from(t.amount)).sum();
            let held: BigUint = coins.iter().map(|(_, b)| b).sum();
            if held < needed {
                return Err(StepError::Precondition(format!(
                    "insufficient {coin_type} balance: have {held}, need {needed}"
                )));
            }
            let mut ids = coins.into_iter().map(|(id, _)| id);
            let primary = ids
                .next()
                .ok_or_else(|| StepError::Precondition(format!("no {coin_type} coins owned")))?;
            CoinSource::Coins {
                primary,
                merge: ids.collect(),
            }
        };

        let plan = builders::multi_transfer(&source, &transfers)?;
        Ok(transaction_output(execute(inv.session, &plan, &gas).await?))
    })
}

fn drain_all(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let recipient = account_address(&inv.params, "recipient")?;
        let gas = gas_config(&inv.params)?;
        let owner = inv.session.require_signer()?.address_string();
        let coins: Vec<String> = owned_coins(inv.session, &owner, SUI_COIN_TYPE)
            .await?
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        if coins.is_empty() {
            return Err(StepError::Precondition(format!("{owner} owns no SUI coins")));
        }
        let plan = builders::drain_all(recipient, coins)?;
        Ok(transaction_output(execute(inv.session, &plan, &gas).await?))
    })
}

fn merge(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let destination = inv.params.object_id("destinationCoinId")?;
        let sources = inv.params.object_ids("sourceCoinIds")?;
        let gas = gas_config(&inv.params)?;
        let plan = builders::merge_coins(&destination, &sources)?;
        Ok(transaction_output(execute(inv.session, &plan, &gas).await?))
    })
}

fn split(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let source = if inv.params.contains("coinObjectId") {
            CoinSource::Coins {
                primary: inv.params.object_id("coinObjectId")?,
                merge: Vec::new(),
            }
        } else {
            CoinSource::Gas
        };
        let amounts = unit_amounts(&inv.params, "amounts")?;
        let recipient = account_address(&inv.params, "recipient")?;
        let gas = gas_config(&inv.params)?;
        let plan = builders::split_coins(&source, &amounts, recipient)?;
        Ok(transaction_output(execute(inv.session, &plan, &gas).await?))
    })
}
