use futures::future::BoxFuture;
use serde_json::{json, Value};

use crate::error::{StepError, StepResult};
use crate::registry::{Invocation, OperationDef};
use crate::response::{page_value, with_raw};
use crate::schema::{ParamKind, ParamSpec, CURSOR, LIMIT};
use sui_steps_transport::SuiRequest;

const RESOURCE: &str = "nameService";

const RESOLVE_ADDRESS: &[ParamSpec] = &[ParamSpec::required("name", ParamKind::String, "Name such as example.sui")];
const RESOLVE_NAMES: &[ParamSpec] = &[
    ParamSpec::signer_address("address", "Address to look up; defaults to the signer"),
    CURSOR,
    LIMIT,
];

pub(crate) fn operations() -> Vec<OperationDef> {
    vec![
        OperationDef::new(
            RESOURCE,
            "resolveAddress",
            "Address a name points to",
            RESOLVE_ADDRESS,
            resolve_address,
        ),
        OperationDef::new(RESOURCE, "resolveNames", "Names owned by an address", RESOLVE_NAMES, resolve_names),
    ]
}

fn resolve_address(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let name = inv.params.string("name")?.to_lowercase();
        if !name.contains('.') && !name.contains('@') {
            return Err(StepError::validation(
                "name",
                format!("'{name}' is not a name (expected e.g. example.sui)"),
            ));
        }
        let result = inv
            .session
            .call(&SuiRequest::ResolveNameServiceAddress { name: name.clone() })
            .await?;
        Ok(with_raw(
            json!({
                "name": name,
                "address": result.clone(),
                "found": !result.is_null(),
            }),
            result,
        ))
    })
}

fn resolve_names(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let address = inv.params.address("address")?;
        let page = inv.params.page()?;
        let result: Value = inv
            .session
            .call(&SuiRequest::ResolveNameServiceNames {
                address,
                cursor: page.cursor,
                limit: Some(page.limit),
            })
            .await?;
        Ok(page_value(&result))
    })
}
