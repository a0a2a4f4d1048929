//! `TxPlan`: the pure step list a builder produces.
//!
//! Inputs are either BCS-encoded pure values or object ids that have not been
//! resolved to references yet. Lowering turns a plan into `TransactionData`.

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{StepError, StepResult};
use sui_steps_types::encoding::base64_encode;

/// Argument reference inside a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanArg {
    GasCoin,
    Input(u16),
    Result(u16),
    NestedResult(u16, u16),
}

impl PlanArg {
    pub fn to_json(&self) -> Value {
        match self {
            PlanArg::GasCoin => json!({"type": "gas"}),
            PlanArg::Input(i) => json!({"type": "input", "index": i}),
            PlanArg::Result(i) => json!({"type": "result", "index": i}),
            PlanArg::NestedResult(i, j) => {
                json!({"type": "nestedResult", "index": i, "resultIndex": j})
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanInput {
    Pure(Vec<u8>),
    /// Object id (normalized); `mutable` matters for shared objects only.
    Object { id: String, mutable: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanCommand {
    MoveCall {
        package: String,
        module: String,
        function: String,
        type_arguments: Vec<String>,
        arguments: Vec<PlanArg>,
    },
    SplitCoins {
        coin: PlanArg,
        amounts: Vec<PlanArg>,
    },
    MergeCoins {
        destination: PlanArg,
        sources: Vec<PlanArg>,
    },
    TransferObjects {
        objects: Vec<PlanArg>,
        recipient: PlanArg,
    },
}

impl PlanCommand {
    fn args(&self) -> Vec<PlanArg> {
        match self {
            PlanCommand::MoveCall { arguments, .. } => arguments.clone(),
            PlanCommand::SplitCoins { coin, amounts } => {
                std::iter::once(*coin).chain(amounts.iter().copied()).collect()
            }
            PlanCommand::MergeCoins {
                destination,
                sources,
            } => std::iter::once(*destination)
                .chain(sources.iter().copied())
                .collect(),
            PlanCommand::TransferObjects { objects, recipient } => objects
                .iter()
                .copied()
                .chain(std::iter::once(*recipient))
                .collect(),
        }
    }

    pub fn to_json(&self) -> Value {
        let list = |args: &[PlanArg]| args.iter().map(PlanArg::to_json).collect::<Vec<_>>();
        match self {
            PlanCommand::MoveCall {
                package,
                module,
                function,
                type_arguments,
                arguments,
            } => json!({
                "kind": "moveCall",
                "target": format!("{package}::{module}::{function}"),
                "typeArguments": type_arguments,
                "arguments": list(arguments),
            }),
            PlanCommand::SplitCoins { coin, amounts } => json!({
                "kind": "splitCoins",
                "coin": coin.to_json(),
                "amounts": list(amounts),
            }),
            PlanCommand::MergeCoins {
                destination,
                sources,
            } => json!({
                "kind": "mergeCoins",
                "destination": destination.to_json(),
                "sources": list(sources),
            }),
            PlanCommand::TransferObjects { objects, recipient } => json!({
                "kind": "transferObjects",
                "objects": list(objects),
                "recipient": recipient.to_json(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxPlan {
    pub inputs: Vec<PlanInput>,
    pub commands: Vec<PlanCommand>,
    /// Coins to pay gas with; empty means pick the sender's SUI coins.
    pub gas_coins: Vec<String>,
}

impl TxPlan {
    /// Object ids referenced as inputs, in input order.
    pub fn object_ids(&self) -> Vec<String> {
        self.inputs
            .iter()
            .filter_map(|input| match input {
                PlanInput::Object { id, .. } => Some(id.clone()),
                PlanInput::Pure(_) => None,
            })
            .collect()
    }

    /// Every `Input` exists and every `Result` points at an earlier command.
    pub fn check_references(&self) -> Result<(), String> {
        for (ci, command) in self.commands.iter().enumerate() {
            for arg in command.args() {
                match arg {
                    PlanArg::GasCoin => {}
                    PlanArg::Input(i) if usize::from(i) >= self.inputs.len() => {
                        return Err(format!(
                            "command {ci} references input {i} but only {} inputs exist",
                            self.inputs.len()
                        ));
                    }
                    PlanArg::Result(i) | PlanArg::NestedResult(i, _) if usize::from(i) >= ci => {
                        return Err(format!(
                            "command {ci} references the result of command {i}, which does not run before it"
                        ));
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> Value {
        let inputs: Vec<Value> = self
            .inputs
            .iter()
            .map(|input| match input {
                PlanInput::Pure(bytes) => json!({"kind": "pure", "bytes": base64_encode(bytes)}),
                PlanInput::Object { id, mutable } => {
                    json!({"kind": "object", "objectId": id, "mutable": mutable})
                }
            })
            .collect();
        json!({
            "inputs": inputs,
            "commands": self.commands.iter().map(PlanCommand::to_json).collect::<Vec<_>>(),
            "gasCoins": self.gas_coins,
        })
    }
}

/// Incremental plan construction.
#[derive(Debug, Default)]
pub struct PlanBuilder {
    plan: TxPlan,
}

impl PlanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_input(&self) -> StepResult<u16> {
        u16::try_from(self.plan.inputs.len())
            .map_err(|_| StepError::build("too many transaction inputs"))
    }

    /// BCS-encode `value` as a pure input.
    pub fn pure<T: Serialize + ?Sized>(&mut self, value: &T) -> StepResult<PlanArg> {
        let bytes = bcs::to_bytes(value).map_err(StepError::build)?;
        self.pure_bytes(bytes)
    }

    pub fn pure_bytes(&mut self, bytes: Vec<u8>) -> StepResult<PlanArg> {
        let index = self.next_input()?;
        self.plan.inputs.push(PlanInput::Pure(bytes));
        Ok(PlanArg::Input(index))
    }

    /// Object input. The same id is only added once; mutable use wins.
    pub fn object(&mut self, id: &str, mutable: bool) -> StepResult<PlanArg> {
        for (i, input) in self.plan.inputs.iter_mut().enumerate() {
            if let PlanInput::Object {
                id: existing,
                mutable: existing_mut,
            } = input
            {
                if existing == id {
                    *existing_mut |= mutable;
                    return Ok(PlanArg::Input(i as u16));
                }
            }
        }
        let index = self.next_input()?;
        self.plan.inputs.push(PlanInput::Object {
            id: id.to_string(),
            mutable,
        });
        Ok(PlanArg::Input(index))
    }

    /// Append a command; returns its `Result` argument.
    pub fn command(&mut self, command: PlanCommand) -> StepResult<PlanArg> {
        let index = u16::try_from(self.plan.commands.len())
            .map_err(|_| StepError::build("too many transaction commands"))?;
        self.plan.commands.push(command);
        Ok(PlanArg::Result(index))
    }

    pub fn gas_coins(&mut self, coins: Vec<String>) {
        self.plan.gas_coins = coins;
    }

    pub fn command_count(&self) -> usize {
        self.plan.commands.len()
    }

    pub fn finish(self) -> TxPlan {
        self.plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_inputs_deduplicate() {
        let mut b = PlanBuilder::new();
        let a = b.object("0xa", false).unwrap();
        let amount = b.pure(&5u64).unwrap();
        let again = b.object("0xa", true).unwrap();
        assert_eq!(a, again);
        assert_eq!(amount, PlanArg::Input(1));
        let plan = b.finish();
        assert_eq!(plan.inputs.len(), 2);
        assert_eq!(
            plan.inputs[0],
            PlanInput::Object {
                id: "0xa".into(),
                mutable: true
            }
        );
        assert_eq!(plan.inputs[1], PlanInput::Pure(5u64.to_le_bytes().to_vec()));
        assert_eq!(plan.object_ids(), vec!["0xa".to_string()]);
    }

    #[test]
    fn test_check_references() {
        let mut b = PlanBuilder::new();
        let amount = b.pure(&1u64).unwrap();
        let split = b
            .command(PlanCommand::SplitCoins {
                coin: PlanArg::GasCoin,
                amounts: vec![amount],
            })
            .unwrap();
        assert_eq!(split, PlanArg::Result(0));
        b.command(PlanCommand::TransferObjects {
            objects: vec![PlanArg::NestedResult(0, 0)],
            recipient: PlanArg::Input(3),
        })
        .unwrap();
        let plan = b.finish();
        let err = plan.check_references().unwrap_err();
        assert!(err.contains("input 3"));

        let forward = TxPlan {
            commands: vec![PlanCommand::MergeCoins {
                destination: PlanArg::GasCoin,
                sources: vec![PlanArg::Result(0)],
            }],
            ..TxPlan::default()
        };
        assert!(forward.check_references().is_err());
    }

    #[test]
    fn test_plan_json() {
        let mut b = PlanBuilder::new();
        b.pure(&true).unwrap();
        b.object("0xb", false).unwrap();
        let json = b.finish().to_json();
        assert_eq!(json["inputs"][0]["kind"], "pure");
        assert_eq!(json["inputs"][0]["bytes"], "AQ==");
        assert_eq!(json["inputs"][1]["objectId"], "0xb");
        assert_eq!(json["commands"], json!([]));
    }
}
