use futures::future::BoxFuture;
use serde_json::{json, Value};

use super::{account_address, gas_config, sui_amount, transaction_output};
use crate::error::{StepError, StepResult};
use crate::registry::{Invocation, OperationDef};
use crate::response::with_raw;
use crate::schema::{ParamKind, ParamSpec, GAS_BUDGET};
use crate::tx::{builders, execute};
use sui_steps_transport::SuiRequest;

const RESOURCE: &str = "staking";

/// Minimum stake accepted by the system package, in MIST.
const MIN_STAKE_MIST: u64 = 1_000_000_000;

const GET_STAKES: &[ParamSpec] = &[ParamSpec::signer_address("owner", "Staker address; defaults to the signer")];
const GET_STAKES_BY_IDS: &[ParamSpec] = &[ParamSpec::required(
    "stakedSuiIds",
    ParamKind::List,
    "StakedSui object ids",
)];
const STAKE: &[ParamSpec] = &[
    ParamSpec::required("validator", ParamKind::Address, "Validator address"),
    ParamSpec::required("amount", ParamKind::Decimal, "Amount in SUI (at least 1)"),
    GAS_BUDGET,
];
const UNSTAKE: &[ParamSpec] = &[
    ParamSpec::required("stakedSuiId", ParamKind::ObjectId, "StakedSui object to withdraw"),
    GAS_BUDGET,
];

pub(crate) fn operations() -> Vec<OperationDef> {
    vec![
        OperationDef::new(RESOURCE, "getStakes", "Delegated stakes of an address", GET_STAKES, get_stakes),
        OperationDef::new(
            RESOURCE,
            "getStakesByIds",
            "Delegated stakes by StakedSui id",
            GET_STAKES_BY_IDS,
            get_stakes_by_ids,
        ),
        OperationDef::new(RESOURCE, "getValidators", "Active validator set", &[], get_validators),
        OperationDef::new(RESOURCE, "getValidatorsApy", "Validator APYs", &[], get_validators_apy),
        OperationDef::new(RESOURCE, "getSystemState", "Latest Sui system state", &[], get_system_state),
        OperationDef::new(RESOURCE, "stake", "Stake SUI with a validator", STAKE, stake).requires_signer(),
        OperationDef::new(RESOURCE, "unstake", "Withdraw a stake", UNSTAKE, unstake).requires_signer(),
    ]
}

fn get_stakes(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let owner = inv.params.address("owner")?;
        inv.session.call(&SuiRequest::GetStakes { owner }).await
    })
}

fn get_stakes_by_ids(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let staked_sui_ids = inv.params.object_ids("stakedSuiIds")?;
        inv.session
            .call(&SuiRequest::GetStakesByIds { staked_sui_ids })
            .await
    })
}

fn validator_view(v: &Value) -> Value {
    json!({
        "suiAddress": v.get("suiAddress"),
        "name": v.get("name"),
        "stakingPoolId": v.get("stakingPoolId"),
        "votingPower": v.get("votingPower"),
        "commissionRate": v.get("commissionRate"),
        "gasPrice": v.get("gasPrice"),
        "stakingPoolSuiBalance": v.get("stakingPoolSuiBalance"),
    })
}

fn get_validators(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let result = inv.session.call(&SuiRequest::GetLatestSuiSystemState).await?;
        let validators: Vec<Value> = result
            .get("activeValidators")
            .and_then(Value::as_array)
            .map(|list| list.iter().map(validator_view).collect())
            .unwrap_or_default();
        Ok(with_raw(
            json!({
                "epoch": result.get("epoch"),
                "count": validators.len(),
                "validators": validators,
            }),
            result,
        ))
    })
}

fn get_validators_apy(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move { inv.session.call(&SuiRequest::GetValidatorsApy).await })
}

fn get_system_state(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move { inv.session.call(&SuiRequest::GetLatestSuiSystemState).await })
}

fn stake(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let validator = account_address(&inv.params, "validator")?;
        let amount = sui_amount(&inv.params, "amount")?;
        if amount < MIN_STAKE_MIST {
            return Err(StepError::validation("amount", "must be at least 1 SUI"));
        }
        let gas = gas_config(&inv.params)?;
        let plan = builders::stake(amount, validator)?;
        Ok(transaction_output(execute(inv.session, &plan, &gas).await?))
    })
}

fn unstake(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let staked_sui_id = inv.params.object_id("stakedSuiId")?;
        let gas = gas_config(&inv.params)?;
        let plan = builders::unstake(&staked_sui_id)?;
        Ok(transaction_output(execute(inv.session, &plan, &gas).await?))
    })
}
