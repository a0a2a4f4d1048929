//! Move module introspection; results pass through unmodified except for
//! the package listing.

use futures::future::BoxFuture;
use serde_json::{json, Value};

use super::fetch_required;
use crate::error::StepResult;
use crate::registry::{Invocation, OperationDef};
use crate::response::with_raw;
use crate::schema::{ParamKind, ParamSpec};
use sui_steps_transport::SuiRequest;

const RESOURCE: &str = "move";

const PACKAGE: ParamSpec = ParamSpec::required("package", ParamKind::ObjectId, "Package id");
const MODULE: ParamSpec = ParamSpec::required("module", ParamKind::String, "Module name");
const FUNCTION: ParamSpec = ParamSpec::required("function", ParamKind::String, "Function name");

const GET_MODULE: &[ParamSpec] = &[PACKAGE, MODULE];
const GET_PACKAGE_MODULES: &[ParamSpec] = &[PACKAGE];
const GET_FUNCTION: &[ParamSpec] = &[PACKAGE, MODULE, FUNCTION];
const GET_STRUCT: &[ParamSpec] = &[
    PACKAGE,
    MODULE,
    ParamSpec::required("struct", ParamKind::String, "Struct name"),
];

pub(crate) fn operations() -> Vec<OperationDef> {
    vec![
        OperationDef::new(RESOURCE, "getModule", "Normalized Move module", GET_MODULE, get_module),
        OperationDef::new(
            RESOURCE,
            "getPackageModules",
            "Every normalized module of a package",
            GET_PACKAGE_MODULES,
            get_package_modules,
        ),
        OperationDef::new(RESOURCE, "getFunction", "Normalized Move function", GET_FUNCTION, get_function),
        OperationDef::new(RESOURCE, "getStruct", "Normalized Move struct", GET_STRUCT, get_struct),
        OperationDef::new(
            RESOURCE,
            "getFunctionArgTypes",
            "Argument kinds of a Move function",
            GET_FUNCTION,
            get_function_arg_types,
        ),
    ]
}

fn get_module(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let package = inv.params.object_id("package")?;
        let module = inv.params.string("module")?;
        let what = format!("module {package}::{module}");
        fetch_required(
            inv.session,
            &SuiRequest::GetNormalizedMoveModule { package, module },
            what,
        )
        .await
    })
}

fn get_package_modules(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let package = inv.params.object_id("package")?;
        let result = fetch_required(
            inv.session,
            &SuiRequest::GetNormalizedMoveModulesByPackage {
                package: package.clone(),
            },
            format!("package {package}"),
        )
        .await?;
        let modules: Vec<&String> = result
            .as_object()
            .map(|m| m.keys().collect())
            .unwrap_or_default();
        Ok(with_raw(
            json!({ "package": package, "modules": modules, "moduleCount": modules.len() }),
            result.clone(),
        ))
    })
}

fn get_function(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let package = inv.params.object_id("package")?;
        let module = inv.params.string("module")?;
        let function = inv.params.string("function")?;
        let what = format!("function {package}::{module}::{function}");
        fetch_required(
            inv.session,
            &SuiRequest::GetNormalizedMoveFunction {
                package,
                module,
                function,
            },
            what,
        )
        .await
    })
}

fn get_struct(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let package = inv.params.object_id("package")?;
        let module = inv.params.string("module")?;
        let name = inv.params.string("struct")?;
        let what = format!("struct {package}::{module}::{name}");
        fetch_required(
            inv.session,
            &SuiRequest::GetNormalizedMoveStruct {
                package,
                module,
                name,
            },
            what,
        )
        .await
    })
}

fn get_function_arg_types(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let package = inv.params.object_id("package")?;
        let module = inv.params.string("module")?;
        let function = inv.params.string("function")?;
        let result: Value = inv
            .session
            .call(&SuiRequest::GetMoveFunctionArgTypes {
                package,
                module,
                function,
            })
            .await?;
        Ok(result)
    })
}
