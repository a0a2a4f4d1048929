use futures::future::BoxFuture;
use serde_json::{json, Value};

use crate::error::StepResult;
use crate::params::Params;
use crate::registry::{Invocation, OperationDef};
use crate::response::page_value;
use crate::schema::{ParamKind, ParamSpec, CURSOR, DESCENDING, LIMIT};
use crate::session::Session;
use sui_steps_transport::SuiRequest;

const RESOURCE: &str = "event";

const QUERY: &[ParamSpec] = &[
    ParamSpec::required(
        "filter",
        ParamKind::Json,
        "EventFilter, e.g. {\"MoveEventType\": \"0x3::validator::StakingRequestEvent\"}",
    ),
    CURSOR,
    LIMIT,
    DESCENDING,
];
const GET_BY_TRANSACTION: &[ParamSpec] = &[ParamSpec::required("digest", ParamKind::Digest, "Transaction digest")];
const QUERY_BY_TYPE: &[ParamSpec] = &[
    ParamSpec::required("eventType", ParamKind::String, "Event struct type"),
    CURSOR,
    LIMIT,
    DESCENDING,
];
const QUERY_BY_SENDER: &[ParamSpec] = &[
    ParamSpec::signer_address("sender", "Sender address; defaults to the signer"),
    CURSOR,
    LIMIT,
    DESCENDING,
];
const QUERY_BY_MODULE: &[ParamSpec] = &[
    ParamSpec::required("package", ParamKind::ObjectId, "Package id"),
    ParamSpec::required("module", ParamKind::String, "Module name"),
    CURSOR,
    LIMIT,
    DESCENDING,
];

pub(crate) fn operations() -> Vec<OperationDef> {
    vec![
        OperationDef::new(RESOURCE, "query", "Query events with an arbitrary filter", QUERY, query),
        OperationDef::new(
            RESOURCE,
            "getByTransaction",
            "Events emitted by one transaction",
            GET_BY_TRANSACTION,
            get_by_transaction,
        ),
        OperationDef::new(RESOURCE, "queryByType", "Events of one struct type", QUERY_BY_TYPE, query_by_type),
        OperationDef::new(
            RESOURCE,
            "queryBySender",
            "Events from transactions sent by an address",
            QUERY_BY_SENDER,
            query_by_sender,
        ),
        OperationDef::new(
            RESOURCE,
            "queryByModule",
            "Events from transactions calling a module",
            QUERY_BY_MODULE,
            query_by_module,
        ),
    ]
}

async fn query_page(session: &Session, params: &Params, filter: Value) -> StepResult {
    let page = params.page()?;
    let result = session
        .call(&SuiRequest::QueryEvents {
            query: filter,
            cursor: page.cursor,
            limit: Some(page.limit),
            descending: params.descending()?,
        })
        .await?;
    Ok(page_value(&result))
}

fn query(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let filter = inv.params.json("filter")?;
        query_page(inv.session, &inv.params, filter).await
    })
}

fn get_by_transaction(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let digest = inv.params.digest("digest")?;
        inv.session.call(&SuiRequest::GetEvents { digest }).await
    })
}

fn query_by_type(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let event_type = inv.params.string("eventType")?;
        query_page(inv.session, &inv.params, json!({ "MoveEventType": event_type })).await
    })
}

fn query_by_sender(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let sender = inv.params.address("sender")?;
        query_page(inv.session, &inv.params, json!({ "Sender": sender })).await
    })
}

fn query_by_module(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let package = inv.params.object_id("package")?;
        let module = inv.params.string("module")?;
        let filter = json!({ "MoveModule": { "package": package, "module": module } });
        query_page(inv.session, &inv.params, filter).await
    })
}
