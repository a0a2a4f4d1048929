use futures::future::BoxFuture;
use serde_json::json;

use super::{account_address, fetch_object, gas_config, object_summary, transaction_output};
use crate::error::{StepError, StepResult};
use crate::registry::{Invocation, OperationDef};
use crate::response::{page_value, with_raw};
use crate::schema::{ParamKind, ParamSpec, CURSOR, GAS_BUDGET, LIMIT};
use crate::tx::{builders, execute};
use sui_steps_transport::jsonrpc::methods::full_object_options;
use sui_steps_transport::{lookup, Lookup, SuiRequest};

const RESOURCE: &str = "object";

const OBJECT_ID: ParamSpec = ParamSpec::required("objectId", ParamKind::ObjectId, "Object id");
const PARENT_ID: ParamSpec = ParamSpec::required("parentId", ParamKind::ObjectId, "Parent object id");

const GET: &[ParamSpec] = &[OBJECT_ID];
const MULTI_GET: &[ParamSpec] = &[ParamSpec::required("objectIds", ParamKind::List, "Object ids")];
const GET_PAST: &[ParamSpec] = &[
    OBJECT_ID,
    ParamSpec::required("version", ParamKind::Integer, "Object version"),
];
const GET_BY_TYPE: &[ParamSpec] = &[
    ParamSpec::signer_address("owner", "Owner address; defaults to the signer"),
    ParamSpec::required(
        "structType",
        ParamKind::String,
        "Fully qualified struct type, e.g. 0x2::coin::Coin<0x2::sui::SUI>",
    ),
    CURSOR,
    LIMIT,
];
const GET_DYNAMIC_FIELDS: &[ParamSpec] = &[PARENT_ID, CURSOR, LIMIT];
const GET_DYNAMIC_FIELD_OBJECT: &[ParamSpec] = &[
    PARENT_ID,
    ParamSpec::required(
        "name",
        ParamKind::Json,
        "DynamicFieldName, e.g. {\"type\": \"u64\", \"value\": \"1\"}",
    ),
];
const TRANSFER: &[ParamSpec] = &[
    ParamSpec::required("objectIds", ParamKind::List, "Objects to transfer"),
    ParamSpec::required("recipient", ParamKind::Address, "Recipient address"),
    GAS_BUDGET,
];

pub(crate) fn operations() -> Vec<OperationDef> {
    vec![
        OperationDef::new(RESOURCE, "get", "Fetch an object", GET, get),
        OperationDef::new(RESOURCE, "multiGet", "Fetch several objects", MULTI_GET, multi_get),
        OperationDef::new(RESOURCE, "getPast", "Fetch an object at a past version", GET_PAST, get_past),
        OperationDef::new(
            RESOURCE,
            "getByType",
            "Objects of one struct type owned by an address",
            GET_BY_TYPE,
            get_by_type,
        ),
        OperationDef::new(
            RESOURCE,
            "getDynamicFields",
            "Dynamic fields of an object",
            GET_DYNAMIC_FIELDS,
            get_dynamic_fields,
        ),
        OperationDef::new(
            RESOURCE,
            "getDynamicFieldObject",
            "One dynamic field object by name",
            GET_DYNAMIC_FIELD_OBJECT,
            get_dynamic_field_object,
        ),
        OperationDef::new(RESOURCE, "transfer", "Transfer objects to an address", TRANSFER, transfer)
            .requires_signer(),
    ]
}

fn get(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let object_id = inv.params.object_id("objectId")?;
        let result = fetch_object(inv.session, &object_id, full_object_options()).await?;
        Ok(with_raw(object_summary(&result), result))
    })
}

fn multi_get(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let object_ids = inv.params.object_ids("objectIds")?;
        inv.session
            .call(&SuiRequest::MultiGetObjects {
                object_ids,
                options: full_object_options(),
            })
            .await
    })
}

fn get_past(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let object_id = inv.params.object_id("objectId")?;
        let version = inv.params.u64("version")?;
        let result = inv
            .session
            .call(&SuiRequest::TryGetPastObject {
                object_id: object_id.clone(),
                version,
                options: full_object_options(),
            })
            .await?;
        match Lookup::from_object_response(result) {
            Lookup::Found(result) => Ok(result),
            Lookup::NotFound => Err(StepError::not_found(format!(
                "object {object_id} at version {version}"
            ))),
        }
    })
}

fn get_by_type(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let owner = inv.params.address("owner")?;
        let struct_type = inv.params.string("structType")?;
        let page = inv.params.page()?;
        let result = inv
            .session
            .call(&SuiRequest::GetOwnedObjects {
                owner,
                query: json!({
                    "filter": { "StructType": struct_type },
                    "options": full_object_options(),
                }),
                cursor: page.cursor,
                limit: Some(page.limit),
            })
            .await?;
        Ok(page_value(&result))
    })
}

fn get_dynamic_fields(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let parent_id = inv.params.object_id("parentId")?;
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

fn get_dynamic_field_object(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let parent_id = inv.params.object_id("parentId")?;
        let name = inv.params.json("name")?;
        if name.get("type").is_none() || name.get("value").is_none() {
            return Err(StepError::validation(
                "name",
                "expected {\"type\": <move type>, \"value\": <value>}",
            ));
        }
        let outcome = inv
            .session
            .transport()
            .call(&SuiRequest::GetDynamicFieldObject {
                parent_id: parent_id.clone(),
                name,
            })
            .await;
        let missing = || StepError::not_found(format!("dynamic field of {parent_id}"));
        match lookup(outcome)? {
            Lookup::Found(result) => match Lookup::from_object_response(result) {
                Lookup::Found(result) => Ok(with_raw(object_summary(&result), result)),
                Lookup::NotFound => Err(missing()),
            },
            Lookup::NotFound => Err(missing()),
        }
    })
}

fn transfer(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let object_ids = inv.params.object_ids("objectIds")?;
        let recipient = account_address(&inv.params, "recipient")?;
        let gas = gas_config(&inv.params)?;
        let plan = builders::transfer_objects(&object_ids, recipient)?;
        Ok(transaction_output(execute(inv.session, &plan, &gas).await?))
    })
}
