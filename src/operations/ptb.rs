//! Programmable transaction blocks assembled from a JSON command list.
//!
//! ```json
//! [
//!   {"kind": "splitCoins", "coin": {"type": "gas"}, "amounts": [{"type": "u64", "value": 1000}]},
//!   {"kind": "transferObjects",
//!    "objects": [{"type": "nestedResult", "index": 0, "resultIndex": 0}],
//!    "recipient": {"type": "address", "value": "0x..."}}
//! ]
//! ```
//!
//! Every argument uses the tagged form of [`crate::tx::args`]. An `input`
//! reference points at the inputs created by earlier arguments, in order of
//! first appearance.

use futures::future::BoxFuture;
use serde_json::{json, Value};

use super::contract::{dev_inspect_output, json_array};
use super::{gas_config, transaction_output};
use crate::error::{StepError, StepResult};
use crate::params::Params;
use crate::registry::{Invocation, OperationDef};
use crate::schema::{ParamKind, ParamSpec, GAS_BUDGET};
use crate::tx::args::parse_tagged_arg;
use crate::tx::builders::MoveTarget;
use crate::tx::lower::check_plan;
use crate::tx::{dev_inspect, dry_run, execute, GasEstimate, PlanArg, PlanBuilder, PlanCommand, TxPlan};

const RESOURCE: &str = "ptb";

const COMMANDS: ParamSpec = ParamSpec::required(
    "commands",
    ParamKind::Json,
    "Commands: moveCall, splitCoins, mergeCoins, transferObjects",
);
const GAS_COINS: ParamSpec = ParamSpec::optional(
    "gasCoins",
    ParamKind::List,
    "Coins to pay gas with; defaults to the sender's SUI coins",
);

const BUILD: &[ParamSpec] = &[COMMANDS, GAS_COINS];
const EXECUTE: &[ParamSpec] = &[COMMANDS, GAS_COINS, GAS_BUDGET];
const DEV_INSPECT: &[ParamSpec] = &[
    COMMANDS,
    ParamSpec::signer_address("sender", "Sender to inspect as; defaults to the signer"),
];

pub(crate) fn operations() -> Vec<OperationDef> {
    vec![
        OperationDef::new(RESOURCE, "build", "Validate commands and return the plan", BUILD, build),
        OperationDef::new(RESOURCE, "execute", "Sign and execute the commands", EXECUTE, execute_ptb)
            .requires_signer(),
        OperationDef::new(
            RESOURCE,
            "dryRun",
            "Simulate the commands as the signer",
            EXECUTE,
            dry_run_ptb,
        )
        .requires_signer(),
        OperationDef::new(
            RESOURCE,
            "devInspect",
            "Evaluate the commands without gas or signature",
            DEV_INSPECT,
            dev_inspect_ptb,
        ),
    ]
}

struct CommandReader<'a> {
    builder: &'a mut PlanBuilder,
    fields: &'a serde_json::Map<String, Value>,
    label: String,
}

impl CommandReader<'_> {
    fn field(&self, name: &str) -> StepResult<&Value> {
        self.fields.get(name).ok_or_else(|| {
            StepError::validation(format!("{}.{name}", self.label), "is required")
        })
    }

    fn arg(&mut self, name: &str) -> StepResult<PlanArg> {
        let label = format!("{}.{name}", self.label);
        let value = self.field(name)?.clone();
        parse_tagged_arg(&value, &label)?.into_plan_arg(self.builder)
    }

    fn args(&mut self, name: &str) -> StepResult<Vec<PlanArg>> {
        let label = format!("{}.{name}", self.label);
        let items = match self.fields.get(name) {
            None => Vec::new(),
            Some(Value::Array(items)) => items.clone(),
            Some(other) => {
                return Err(StepError::validation(
                    label,
                    format!("expected an array, got {other}"),
                ))
            }
        };
        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                parse_tagged_arg(item, &format!("{label}[{i}]"))?.into_plan_arg(self.builder)
            })
            .collect()
    }

    fn non_empty_args(&mut self, name: &str) -> StepResult<Vec<PlanArg>> {
        let args = self.args(name)?;
        if args.is_empty() {
            return Err(StepError::validation(
                format!("{}.{name}", self.label),
                "must not be empty",
            ));
        }
        Ok(args)
    }

    fn strings(&self, name: &str) -> StepResult<Vec<String>> {
        let label = format!("{}.{name}", self.label);
        match self.fields.get(name) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        StepError::validation(format!("{label}[{i}]"), "expected a type string")
                    })
                })
                .collect(),
            Some(other) => Err(StepError::validation(
                label,
                format!("expected an array, got {other}"),
            )),
        }
    }

    fn command(&mut self) -> StepResult<PlanCommand> {
        let kind = self
            .field("kind")?
            .as_str()
            .ok_or_else(|| StepError::validation(format!("{}.kind", self.label), "expected a string"))?
            .to_string();
        match kind.as_str() {
            "moveCall" => {
                let target_label = format!("{}.target", self.label);
                let target = self
                    .field("target")?
                    .as_str()
                    .ok_or_else(|| StepError::validation(&target_label, "expected a string"))
                    .and_then(|t| {
                        MoveTarget::parse(t).map_err(|m| StepError::validation(&target_label, m))
                    })?;
                let type_arguments = self.strings("typeArguments")?;
                let arguments = self.args("arguments")?;
                Ok(PlanCommand::MoveCall {
                    package: target.package,
                    module: target.module,
                    function: target.function,
                    type_arguments,
                    arguments,
                })
            }
            "splitCoins" => {
                let coin = self.arg("coin")?;
                let amounts = self.non_empty_args("amounts")?;
                Ok(PlanCommand::SplitCoins { coin, amounts })
            }
            "mergeCoins" => {
                let destination = self.arg("destination")?;
                let sources = self.non_empty_args("sources")?;
                Ok(PlanCommand::MergeCoins {
                    destination,
                    sources,
                })
            }
            "transferObjects" => {
                let objects = self.non_empty_args("objects")?;
                let recipient = self.arg("recipient")?;
                Ok(PlanCommand::TransferObjects { objects, recipient })
            }
            other => Err(StepError::validation(
                format!("{}.kind", self.label),
                format!(
                    "unknown command '{other}'; expected moveCall, splitCoins, mergeCoins or transferObjects"
                ),
            )),
        }
    }
}

/// Parse and statically check a command list into a plan.
pub(crate) fn parse_commands(commands: &[Value]) -> StepResult<TxPlan> {
    if commands.is_empty() {
        return Err(StepError::validation("commands", "must not be empty"));
    }
    let mut builder = PlanBuilder::new();
    for (i, value) in commands.iter().enumerate() {
        let label = format!("commands[{i}]");
        let fields = value.as_object().ok_or_else(|| {
            StepError::validation(&label, format!("expected a command object, got {value}"))
        })?;
        let command = CommandReader {
            builder: &mut builder,
            fields,
            label,
        }
        .command()?;
        builder.command(command)?;
    }
    let plan = builder.finish();
    check_plan(&plan)?;
    Ok(plan)
}

fn plan_from_params(params: &Params) -> StepResult<TxPlan> {
    if !params.contains("commands") {
        return Err(StepError::validation("commands", "is required"));
    }
    let mut plan = parse_commands(&json_array(params, "commands")?)?;
    if params.contains("gasCoins") {
        plan.gas_coins = params.object_ids("gasCoins")?;
    }
    Ok(plan)
}

fn build(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let plan = plan_from_params(&inv.params)?;
        let mut out = plan.to_json();
        out["inputCount"] = json!(plan.inputs.len());
        out["commandCount"] = json!(plan.commands.len());
        Ok(out)
    })
}

fn execute_ptb(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let plan = plan_from_params(&inv.params)?;
        let gas = gas_config(&inv.params)?;
        Ok(transaction_output(execute(inv.session, &plan, &gas).await?))
    })
}

fn dry_run_ptb(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let plan = plan_from_params(&inv.params)?;
        let gas = gas_config(&inv.params)?;
        let sender = inv.session.require_signer()?.address();
        let result = dry_run(inv.session, sender, &plan, &gas).await?;
        let estimate = GasEstimate::from_effects(&result)?;
        Ok(json!({
            "status": result.pointer("/effects/status/status"),
            "error": result.pointer("/effects/status/error"),
            "gas": estimate.to_json(),
            "raw": result,
        }))
    })
}

fn dev_inspect_ptb(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let plan = plan_from_params(&inv.params)?;
        let sender = inv.params.address("sender")?;
        Ok(dev_inspect_output(dev_inspect(inv.session, &sender, &plan).await?))
    })
}
