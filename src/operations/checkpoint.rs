use futures::future::BoxFuture;
use serde_json::json;

use super::fetch_required;
use crate::error::StepResult;
use crate::registry::{Invocation, OperationDef};
use crate::response::{page_value, with_raw};
use crate::schema::{ParamKind, ParamSpec, CURSOR, DESCENDING, LIMIT};
use sui_steps_transport::SuiRequest;

const RESOURCE: &str = "checkpoint";

const GET: &[ParamSpec] = &[ParamSpec::required(
    "id",
    ParamKind::String,
    "Checkpoint sequence number or digest",
)];
const LIST: &[ParamSpec] = &[CURSOR, LIMIT, DESCENDING];

pub(crate) fn operations() -> Vec<OperationDef> {
    vec![
        OperationDef::new(RESOURCE, "get", "Fetch a checkpoint", GET, get),
        OperationDef::new(RESOURCE, "list", "Page through checkpoints", LIST, list),
        OperationDef::new(
            RESOURCE,
            "getLatestSequenceNumber",
            "Sequence number of the latest executed checkpoint",
            &[],
            get_latest_sequence_number,
        ),
        OperationDef::new(
            RESOURCE,
            "getChainIdentifier",
            "Chain identifier (first checkpoint digest prefix)",
            &[],
            get_chain_identifier,
        ),
        OperationDef::new(RESOURCE, "getEpochInfo", "Current epoch summary", &[], get_epoch_info),
    ]
}

fn get(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let id = inv.params.string("id")?;
        let what = format!("checkpoint {id}");
        fetch_required(inv.session, &SuiRequest::GetCheckpoint { id }, what).await
    })
}

fn list(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let page = inv.params.page()?;
        let result = inv
            .session
            .call(&SuiRequest::GetCheckpoints {
                cursor: page.cursor,
                limit: Some(page.limit),
                descending: inv.params.descending()?,
            })
            .await?;
        Ok(page_value(&result))
    })
}

fn get_latest_sequence_number(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let result = inv
            .session
            .call(&SuiRequest::GetLatestCheckpointSequenceNumber)
            .await?;
        Ok(with_raw(json!({ "sequenceNumber": result.clone() }), result))
    })
}

fn get_chain_identifier(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let result = inv.session.call(&SuiRequest::GetChainIdentifier).await?;
        Ok(with_raw(
            json!({
                "chainIdentifier": result.clone(),
                "network": inv.session.network().as_str(),
            }),
            result,
        ))
    })
}

fn get_epoch_info(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let result = inv.session.call(&SuiRequest::GetLatestSuiSystemState).await?;
        Ok(with_raw(
            json!({
                "epoch": result.get("epoch"),
                "epochStartTimestampMs": result.get("epochStartTimestampMs"),
                "epochDurationMs": result.get("epochDurationMs"),
                "protocolVersion": result.get("protocolVersion"),
                "referenceGasPrice": result.get("referenceGasPrice"),
                "totalStake": result.get("totalStake"),
                "safeMode": result.get("safeMode"),
            }),
            result,
        ))
    })
}
