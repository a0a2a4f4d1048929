use futures::future::BoxFuture;
use serde_json::{json, Value};

use super::{account_address, fetch_object, gas_config, transaction_output};
use crate::error::StepResult;
use crate::registry::{Invocation, OperationDef};
use crate::response::{page_value_with, with_raw};
use crate::schema::{ParamKind, ParamSpec, CURSOR, GAS_BUDGET, LIMIT};
use crate::tx::{builders, execute};
use sui_steps_transport::SuiRequest;

const RESOURCE: &str = "nft";

const LIST: &[ParamSpec] = &[
    ParamSpec::signer_address("owner", "Owner address; defaults to the signer"),
    ParamSpec::optional(
        "collectionType",
        ParamKind::String,
        "Struct type of the collection; all non-coin objects when omitted",
    ),
    CURSOR,
    LIMIT,
];
const GET: &[ParamSpec] = &[ParamSpec::required("objectId", ParamKind::ObjectId, "NFT object id")];
const TRANSFER: &[ParamSpec] = &[
    ParamSpec::required("objectId", ParamKind::ObjectId, "NFT object id"),
    ParamSpec::required("recipient", ParamKind::Address, "Recipient address"),
    GAS_BUDGET,
];

pub(crate) fn operations() -> Vec<OperationDef> {
    vec![
        OperationDef::new(RESOURCE, "list", "NFTs owned by an address", LIST, list),
        OperationDef::new(RESOURCE, "get", "One NFT with its display metadata", GET, get),
        OperationDef::new(RESOURCE, "transfer", "Transfer an NFT", TRANSFER, transfer).requires_signer(),
    ]
}

fn nft_options() -> Value {
    json!({ "showType": true, "showOwner": true, "showDisplay": true, "showContent": true })
}

/// `{objectId, type, name, description, imageUrl, display}` from an object response.
fn nft_view(entry: &Value) -> Value {
    let data = entry.get("data").unwrap_or(&Value::Null);
    let display = data.pointer("/display/data").cloned().unwrap_or(Value::Null);
    let field = |key: &str| {
        display
            .get(key)
            .cloned()
            .or_else(|| data.pointer(&format!("/content/fields/{key}")).cloned())
            .unwrap_or(Value::Null)
    };
    json!({
        "objectId": data.get("objectId"),
        "type": data.get("type"),
        "owner": data.get("owner"),
        "name": field("name"),
        "description": field("description"),
        "imageUrl": field("image_url"),
        "display": display,
    })
}

fn list(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let owner = inv.params.address("owner")?;
        let filter = match inv.params.opt_string("collectionType")? {
            Some(struct_type) => json!({ "StructType": struct_type }),
            None => json!({ "MatchNone": [{ "StructType": "0x2::coin::Coin" }] }),
        };
        let page = inv.params.page()?;
        let result = inv
            .session
            .call(&SuiRequest::GetOwnedObjects {
                owner,
                query: json!({ "filter": filter, "options": nft_options() }),
                cursor: page.cursor,
                limit: Some(page.limit),
            })
            .await?;
        Ok(page_value_with(&result, nft_view))
    })
}

fn get(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let object_id = inv.params.object_id("objectId")?;
        let result = fetch_object(inv.session, &object_id, nft_options()).await?;
        Ok(with_raw(nft_view(&result), result))
    })
}

fn transfer(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let object_id = inv.params.object_id("objectId")?;
        let recipient = account_address(&inv.params, "recipient")?;
        let gas = gas_config(&inv.params)?;
        let plan = builders::transfer_objects(&[object_id], recipient)?;
        Ok(transaction_output(execute(inv.session, &plan, &gas).await?))
    })
}
