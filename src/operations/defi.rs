//! Pool lookups. Pools are plain shared objects; the coin types come from
//! the pool's type parameters.

use futures::future::BoxFuture;
use serde_json::{json, Value};

use super::{fetch_object, object_summary};
use crate::error::{StepError, StepResult};
use crate::registry::{Invocation, OperationDef};
use crate::response::{page_value, with_raw};
use crate::schema::{ParamKind, ParamSpec, CURSOR, DESCENDING, LIMIT};
use sui_steps_transport::jsonrpc::methods::full_object_options;
use sui_steps_transport::SuiRequest;
use sui_steps_types::coin_type::split_type_params;

const RESOURCE: &str = "defi";

const POOL_ID: ParamSpec = ParamSpec::required("poolId", ParamKind::ObjectId, "Pool object id");

const GET_POOL: &[ParamSpec] = &[POOL_ID];
const GET_POOLS: &[ParamSpec] = &[ParamSpec::required("poolIds", ParamKind::List, "Pool object ids")];
const GET_POOL_EVENTS: &[ParamSpec] = &[
    ParamSpec::optional("package", ParamKind::ObjectId, "Package that defines the events"),
    ParamSpec::optional("module", ParamKind::String, "Module that defines the events"),
    ParamSpec::optional(
        "eventType",
        ParamKind::String,
        "Exact event struct type; replaces package and module",
    ),
    CURSOR,
    LIMIT,
    DESCENDING,
];
const GET_POOL_DYNAMIC_FIELDS: &[ParamSpec] = &[POOL_ID, CURSOR, LIMIT];

pub(crate) fn operations() -> Vec<OperationDef> {
    vec![
        OperationDef::new(RESOURCE, "getPool", "Pool object with its coin types", GET_POOL, get_pool),
        OperationDef::new(RESOURCE, "getPools", "Several pool objects", GET_POOLS, get_pools),
        OperationDef::new(
            RESOURCE,
            "getPoolEvents",
            "Events emitted by a protocol package",
            GET_POOL_EVENTS,
            get_pool_events,
        ),
        OperationDef::new(
            RESOURCE,
            "getPoolDynamicFields",
            "Dynamic fields (ticks, positions) of a pool",
            GET_POOL_DYNAMIC_FIELDS,
            get_pool_dynamic_fields,
        ),
    ]
}

/// Type parameters of `0xP::m::Pool<A, B>`, outermost level only.
fn type_parameters(object_type: &str) -> Vec<String> {
    let Some(start) = object_type.find('<') else {
        return Vec::new();
    };
    let Some(inner) = object_type[start + 1..].strip_suffix('>') else {
        return Vec::new();
    };
    split_type_params(inner)
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn pool_view(entry: &Value) -> Value {
    let mut view = object_summary(entry);
    let coin_types = entry
        .pointer("/data/type")
        .and_then(Value::as_str)
        .map(type_parameters)
        .unwrap_or_default();
    view["poolId"] = view["objectId"].clone();
    view["coinTypes"] = json!(coin_types);
    view
}

fn get_pool(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let pool_id = inv.params.object_id("poolId")?;
        let result = fetch_object(inv.session, &pool_id, full_object_options()).await?;
        Ok(with_raw(pool_view(&result), result))
    })
}

fn get_pools(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let object_ids = inv.params.object_ids("poolIds")?;
        let result = inv
            .session
            .call(&SuiRequest::MultiGetObjects {
                object_ids,
                options: full_object_options(),
            })
            .await?;
        let pools: Vec<Value> = result
            .as_array()
            .map(|entries| entries.iter().map(pool_view).collect())
            .unwrap_or_default();
        Ok(with_raw(json!({ "pools": pools }), result))
    })
}

fn get_pool_events(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let query = match inv.params.opt_string("eventType")? {
            Some(event_type) => json!({ "MoveEventType": event_type }),
            None => {
                if !inv.params.contains("package") {
                    return Err(StepError::validation(
                        "package",
                        "is required when eventType is not given",
                    ));
                }
                if !inv.params.contains("module") {
                    return Err(StepError::validation(
                        "module",
                        "is required when eventType is not given",
                    ));
                }
                let package = inv.params.object_id("package")?;
                let module = inv.params.string("module")?;
                json!({ "MoveEventModule": { "package": package, "module": module } })
            }
        };
        let page = inv.params.page()?;
        let result = inv
            .session
            .call(&SuiRequest::QueryEvents {
                query,
                cursor: page.cursor,
                limit: Some(page.limit),
                descending: inv.params.descending()?,
            })
            .await?;
        Ok(page_value(&result))
    })
}

fn get_pool_dynamic_fields(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let parent_id = inv.params.object_id("poolId")?;
        let page = inv.params.page()?;
        let result = inv
            .session
            .call(&SuiRequest::GetDynamicFields {
                parent_id,
                cursor: page.cursor,
                limit: Some(page.limit),
            })
            .await?;
        Ok(page_value(&result))
    })
}
