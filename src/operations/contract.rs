use futures::future::BoxFuture;
use serde_json::{json, Value};

use super::{fetch_object, gas_config, transaction_output};
use crate::error::{StepError, StepResult};
use crate::params::Params;
use crate::registry::{Invocation, OperationDef};
use crate::response::with_raw;
use crate::schema::{ParamKind, ParamSpec, GAS_BUDGET};
use crate::tx::builders::{self, MoveCall};
use crate::tx::lower::check_plan;
use crate::tx::{dev_inspect, execute, TxPlan};

const RESOURCE: &str = "contract";

const TARGET: ParamSpec = ParamSpec::required(
    "target",
    ParamKind::String,
    "Function to call as 0xPACKAGE::module::function",
);
const TYPE_ARGUMENTS: ParamSpec = ParamSpec::optional(
    "typeArguments",
    ParamKind::List,
    "Type arguments, e.g. [\"0x2::sui::SUI\"]",
);
const ARGUMENTS: ParamSpec = ParamSpec::optional(
    "arguments",
    ParamKind::Json,
    "Tagged arguments: [{\"type\": \"u64\", \"value\": \"1\"}, {\"type\": \"object\", \"value\": \"0x...\"}]",
);

const CALL: &[ParamSpec] = &[TARGET, TYPE_ARGUMENTS, ARGUMENTS, GAS_BUDGET];
const DEV_INSPECT: &[ParamSpec] = &[
    TARGET,
    TYPE_ARGUMENTS,
    ARGUMENTS,
    ParamSpec::signer_address("sender", "Sender to inspect as; defaults to the signer"),
];
const GET_PACKAGE: &[ParamSpec] = &[ParamSpec::required("packageId", ParamKind::ObjectId, "Package id")];

pub(crate) fn operations() -> Vec<OperationDef> {
    vec![
        OperationDef::new(RESOURCE, "call", "Execute a Move function call", CALL, call).requires_signer(),
        OperationDef::new(
            RESOURCE,
            "devInspect",
            "Evaluate a Move function call without committing",
            DEV_INSPECT,
            dev_inspect_call,
        ),
        OperationDef::new(RESOURCE, "getPackage", "Package object and its module names", GET_PACKAGE, get_package),
    ]
}

/// JSON array parameter, empty when absent.
pub(crate) fn json_array(params: &Params, name: &str) -> StepResult<Vec<Value>> {
    match params.opt_json(name)? {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(StepError::validation(
            name,
            format!("expected a JSON array, got {other}"),
        )),
    }
}

/// Validated single-call plan from `target`, `typeArguments` and `arguments`.
fn move_call_plan(params: &Params) -> StepResult<TxPlan> {
    let target = params.string("target")?;
    let type_arguments = if params.contains("typeArguments") {
        params.list("typeArguments")?
    } else {
        Vec::new()
    };
    let arguments = json_array(params, "arguments")?;
    let call = MoveCall::from_json(&target, type_arguments, &arguments)?;
    let plan = builders::move_call(&call)?;
    check_plan(&plan)?;
    Ok(plan)
}

pub(crate) fn dev_inspect_output(result: Value) -> Value {
    with_raw(
        json!({
            "status": result.pointer("/effects/status/status"),
            "error": result.get("error").filter(|e| !e.is_null()).or_else(|| result.pointer("/effects/status/error")),
            "results": result.get("results"),
            "events": result.get("events"),
            "gasUsed": result.pointer("/effects/gasUsed"),
        }),
        result,
    )
}

fn call(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let plan = move_call_plan(&inv.params)?;
        let gas = gas_config(&inv.params)?;
        Ok(transaction_output(execute(inv.session, &plan, &gas).await?))
    })
}

fn dev_inspect_call(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let plan = move_call_plan(&inv.params)?;
        let sender = inv.params.address("sender")?;
        Ok(dev_inspect_output(dev_inspect(inv.session, &sender, &plan).await?))
    })
}

fn get_package(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let package_id = inv.params.object_id("packageId")?;
        let options = json!({ "showType": true, "showOwner": true, "showContent": true });
        let result = fetch_object(inv.session, &package_id, options).await?;
        let data = result.get("data").unwrap_or(&Value::Null);
        let content = data.get("content").unwrap_or(&Value::Null);
        if content.get("dataType").and_then(Value::as_str) != Some("package") {
            return Err(StepError::validation(
                "packageId",
                format!("{package_id} is not a package"),
            ));
        }
        let modules: Vec<String> = content
            .get("disassembled")
            .and_then(Value::as_object)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        Ok(with_raw(
            json!({
                "packageId": package_id,
                "version": data.get("version"),
                "modules": modules,
            }),
            result.clone(),
        ))
    })
}
