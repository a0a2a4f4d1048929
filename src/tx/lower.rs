//! Lowering: resolve a [`TxPlan`] against the chain into `TransactionData`.
//!
//! Object inputs are resolved with `sui_multiGetObjects`, gas coins with
//! `suix_getCoins` and the gas price with `suix_getReferenceGasPrice`.

use move_core_types::language_storage::TypeTag;
use serde_json::Value;
use std::collections::HashSet;
use std::str::FromStr;
use sui_types::base_types::{ObjectDigest, ObjectID, ObjectRef, SequenceNumber, SuiAddress};
use sui_types::programmable_transaction_builder::ProgrammableTransactionBuilder;
use sui_types::transaction::{
    Argument, CallArg, Command, ObjectArg, ProgrammableMoveCall, ProgrammableTransaction,
    SharedObjectMutability, TransactionData, TransactionKind,
};
use sui_types::type_input::TypeInput;
use tracing::debug;

use crate::error::{StepError, StepResult};
use crate::tx::plan::{PlanArg, PlanCommand, PlanInput, TxPlan};
use sui_steps_transport::jsonrpc::methods::owner_object_options;
use sui_steps_transport::jsonrpc::MAX_PAGE_SIZE;
use sui_steps_transport::{Page, RpcTransport, SuiRequest};
use sui_steps_types::address::normalize_address;
use sui_steps_types::SUI_COIN_TYPE;

/// Gas payment accepts at most this many coin objects.
pub const MAX_GAS_COINS: usize = 255;

/// Gas budget (MIST) and optional explicit gas price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasConfig {
    pub budget: u64,
    pub price: Option<u64>,
}

impl GasConfig {
    pub fn new(budget: u64) -> Self {
        Self {
            budget,
            price: None,
        }
    }
}

/// How an input object is passed to the transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedObject {
    /// Address-owned, object-owned or immutable.
    Owned(ObjectRef),
    Shared {
        id: ObjectID,
        initial_shared_version: SequenceNumber,
    },
}

fn parse_u64(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn object_ref_from(id: &str, data: &Value) -> StepResult<ObjectRef> {
    let object_id = ObjectID::from_str(id)
        .map_err(|e| StepError::build(format!("bad object id {id}: {e}")))?;
    let version = parse_u64(data.get("version"))
        .ok_or_else(|| StepError::build(format!("object {id} response has no version")))?;
    let digest = data
        .get("digest")
        .and_then(Value::as_str)
        .ok_or_else(|| StepError::build(format!("object {id} response has no digest")))?;
    let digest = ObjectDigest::from_str(digest)
        .map_err(|e| StepError::build(format!("object {id} has a malformed digest: {e}")))?;
    Ok((object_id, SequenceNumber::from_u64(version), digest))
}

/// Classify one `sui_multiGetObjects` entry by its owner.
pub fn resolve_object_entry(id: &str, entry: &Value) -> StepResult<ResolvedObject> {
    let Some(data) = entry.get("data").filter(|d| !d.is_null()) else {
        return Err(StepError::not_found(format!("object {id}")));
    };
    let owner = data.get("owner").unwrap_or(&Value::Null);

    let shared_version = owner
        .get("Shared")
        .and_then(|s| parse_u64(s.get("initial_shared_version")))
        .or_else(|| {
            owner
                .get("ConsensusAddressOwner")
                .and_then(|c| parse_u64(c.get("start_version")))
        });
    if let Some(version) = shared_version {
        let id = ObjectID::from_str(id)
            .map_err(|e| StepError::build(format!("bad object id {id}: {e}")))?;
        return Ok(ResolvedObject::Shared {
            id,
            initial_shared_version: SequenceNumber::from_u64(version),
        });
    }

    let owned = owner.get("AddressOwner").is_some()
        || owner.get("ObjectOwner").is_some()
        || owner.as_str() == Some("Immutable");
    if !owned {
        return Err(StepError::build(format!(
            "object {id} has an unsupported owner: {owner}"
        )));
    }
    Ok(ResolvedObject::Owned(object_ref_from(id, data)?))
}

/// Resolve every id in one `sui_multiGetObjects` call; results follow `ids`.
pub async fn resolve_objects(
    transport: &dyn RpcTransport,
    ids: &[String],
) -> StepResult<Vec<ResolvedObject>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let result = transport
        .call(&SuiRequest::MultiGetObjects {
            object_ids: ids.to_vec(),
            options: owner_object_options(),
        })
        .await?;
    let entries = result.as_array().cloned().unwrap_or_default();
    if entries.len() != ids.len() {
        return Err(StepError::build(format!(
            "sui_multiGetObjects returned {} entries for {} ids",
            entries.len(),
            ids.len()
        )));
    }
    ids.iter()
        .zip(entries.iter())
        .map(|(id, entry)| resolve_object_entry(id, entry))
        .collect()
}

/// Static checks that need no I/O: package ids and type arguments parse.
pub fn check_plan(plan: &TxPlan) -> StepResult<()> {
    plan.check_references()
        .map_err(|m| StepError::validation("commands", m))?;
    for command in &plan.commands {
        if let PlanCommand::MoveCall {
            package,
            type_arguments,
            ..
        } = command
        {
            ObjectID::from_str(package).map_err(|e| {
                StepError::validation("target", format!("invalid package id '{package}': {e}"))
            })?;
            for (i, ty) in type_arguments.iter().enumerate() {
                TypeTag::from_str(ty).map_err(|e| {
                    StepError::validation(
                        format!("typeArguments[{i}]"),
                        format!("invalid type '{ty}': {e}"),
                    )
                })?;
            }
        }
    }
    Ok(())
}

fn call_arg(input: &PlanInput, resolved: Option<&ResolvedObject>) -> StepResult<CallArg> {
    match (input, resolved) {
        (PlanInput::Pure(bytes), _) => Ok(CallArg::Pure(bytes.clone())),
        (PlanInput::Object { .. }, Some(ResolvedObject::Owned(oref))) => {
            Ok(CallArg::Object(ObjectArg::ImmOrOwnedObject(*oref)))
        }
        (
            PlanInput::Object { mutable, .. },
            Some(ResolvedObject::Shared {
                id,
                initial_shared_version,
            }),
        ) => Ok(CallArg::Object(ObjectArg::SharedObject {
            id: *id,
            initial_shared_version: *initial_shared_version,
            mutability: if *mutable {
                SharedObjectMutability::Mutable
            } else {
                SharedObjectMutability::Immutable
            },
        })),
        (PlanInput::Object { id, .. }, None) => {
            Err(StepError::build(format!("object {id} was not resolved")))
        }
    }
}

/// Assemble the programmable transaction from a plan and its resolved objects.
///
/// `resolved` lists the resolution of each object input, in input order.
pub fn build_programmable(
    plan: &TxPlan,
    resolved: &[ResolvedObject],
) -> StepResult<ProgrammableTransaction> {
    let mut ptb = ProgrammableTransactionBuilder::new();
    let mut objects = resolved.iter();
    let mut inputs: Vec<Argument> = Vec::with_capacity(plan.inputs.len());
    for input in &plan.inputs {
        let resolution = match input {
            PlanInput::Object { .. } => objects.next(),
            PlanInput::Pure(_) => None,
        };
        // The builder deduplicates identical inputs, so keep its handles.
        let arg = ptb
            .input(call_arg(input, resolution)?)
            .map_err(StepError::build)?;
        inputs.push(arg);
    }

    let lower_arg = |arg: &PlanArg| -> StepResult<Argument> {
        Ok(match *arg {
            PlanArg::GasCoin => Argument::GasCoin,
            PlanArg::Input(i) => *inputs
                .get(usize::from(i))
                .ok_or_else(|| StepError::build(format!("input {i} does not exist")))?,
            PlanArg::Result(i) => Argument::Result(i),
            PlanArg::NestedResult(i, j) => Argument::NestedResult(i, j),
        })
    };
    let lower_args =
        |args: &[PlanArg]| -> StepResult<Vec<Argument>> { args.iter().map(lower_arg).collect() };

    for command in &plan.commands {
        let command = match command {
            PlanCommand::MoveCall {
                package,
                module,
                function,
                type_arguments,
                arguments,
            } => {
                let package = ObjectID::from_str(package).map_err(StepError::build)?;
                let type_arguments = type_arguments
                    .iter()
                    .map(|t| TypeTag::from_str(t).map(TypeInput::from))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(StepError::build)?;
                Command::MoveCall(Box::new(ProgrammableMoveCall {
                    package,
                    module: module.clone(),
                    function: function.clone(),
                    type_arguments,
                    arguments: lower_args(arguments)?,
                }))
            }
            PlanCommand::SplitCoins { coin, amounts } => {
                Command::SplitCoins(lower_arg(coin)?, lower_args(amounts)?)
            }
            PlanCommand::MergeCoins {
                destination,
                sources,
            } => Command::MergeCoins(lower_arg(destination)?, lower_args(sources)?),
            PlanCommand::TransferObjects { objects, recipient } => {
                Command::TransferObjects(lower_args(objects)?, lower_arg(recipient)?)
            }
        };
        ptb.command(command);
    }
    Ok(ptb.finish())
}

/// Lower to a `TransactionKind` for dev-inspect; no gas is involved.
pub async fn lower_kind(transport: &dyn RpcTransport, plan: &TxPlan) -> StepResult<TransactionKind> {
    check_plan(plan)?;
    let resolved = resolve_objects(transport, &plan.object_ids()).await?;
    Ok(TransactionKind::ProgrammableTransaction(
        build_programmable(plan, &resolved)?,
    ))
}

/// Pick SUI coins of `sender` not used as inputs until `budget` is covered,
/// following `nextCursor` across pages. Stops at [`MAX_GAS_COINS`].
pub async fn select_gas_coins(
    transport: &dyn RpcTransport,
    sender: &SuiAddress,
    exclude: &HashSet<String>,
    budget: u64,
) -> StepResult<Vec<ObjectRef>> {
    let mut selected = Vec::new();
    let mut total: u128 = 0;
    let mut cursor = Value::Null;

    'pages: loop {
        let result = transport
            .call(&SuiRequest::GetCoins {
                owner: sender.to_string(),
                coin_type: Some(SUI_COIN_TYPE.to_string()),
                cursor: cursor.clone(),
                limit: Some(MAX_PAGE_SIZE),
            })
            .await?;
        let page = Page::from_result(&result);

        for coin in &page.data {
            let Some(id) = coin.get("coinObjectId").and_then(Value::as_str) else {
                continue;
            };
            if exclude.contains(&normalize_address(id)) {
                continue;
            }
            selected.push(object_ref_from(id, coin)?);
            total += u128::from(parse_u64(coin.get("balance")).unwrap_or(0));
            if total >= u128::from(budget) || selected.len() >= MAX_GAS_COINS {
                break 'pages;
            }
        }

        if page.data.is_empty() || !page.has_next_page || page.next_cursor.is_null() {
            break;
        }
        cursor = page.next_cursor;
    }

    if selected.is_empty() {
        return Err(StepError::Precondition(format!(
            "no SUI coins available to pay gas for {sender}"
        )));
    }
    if total < u128::from(budget) {
        debug!(%sender, total = total as u64, budget, "gas coins do not cover the budget");
    }
    Ok(selected)
}

pub async fn reference_gas_price(transport: &dyn RpcTransport) -> StepResult<u64> {
    let result = transport.call(&SuiRequest::GetReferenceGasPrice).await?;
    parse_u64(Some(&result)).ok_or_else(|| {
        StepError::build(format!("unexpected reference gas price response: {result}"))
    })
}

/// Resolve objects, gas payment and price; produce `TransactionData`.
pub async fn lower(
    transport: &dyn RpcTransport,
    sender: SuiAddress,
    plan: &TxPlan,
    gas: &GasConfig,
) -> StepResult<TransactionData> {
    check_plan(plan)?;

    let object_ids = plan.object_ids();
    let mut ids = object_ids.clone();
    ids.extend(plan.gas_coins.iter().cloned());
    let resolved = resolve_objects(transport, &ids).await?;
    let (input_objects, gas_objects) = resolved.split_at(object_ids.len());

    let gas_payment = if plan.gas_coins.is_empty() {
        let exclude: HashSet<String> = object_ids.iter().map(|id| normalize_address(id)).collect();
        select_gas_coins(transport, &sender, &exclude, gas.budget).await?
    } else {
        gas_objects
            .iter()
            .zip(&plan.gas_coins)
            .map(|(resolved, id)| match resolved {
                ResolvedObject::Owned(oref) => Ok(*oref),
                ResolvedObject::Shared { .. } => Err(StepError::validation(
                    "coins",
                    format!("gas coin {id} is a shared object"),
                )),
            })
            .collect::<StepResult<Vec<_>>>()?
    };

    let price = match gas.price {
        Some(price) => price,
        None => reference_gas_price(transport).await?,
    };
    let pt = build_programmable(plan, input_objects)?;
    debug!(
        sender = %sender,
        inputs = plan.inputs.len(),
        commands = plan.commands.len(),
        gas_coins = gas_payment.len(),
        budget = gas.budget,
        price,
        "lowered transaction"
    );
    Ok(TransactionData::new_programmable(
        sender,
        gas_payment,
        pt,
        gas.budget,
        price,
    ))
}
