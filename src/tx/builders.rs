//! Transaction builders: typed arguments in, [`TxPlan`] out.
//!
//! Builders never touch the network. Object ids they receive are expected
//! to be normalized already.

use move_core_types::account_address::AccountAddress;
use serde_json::Value;

use crate::error::{StepError, StepResult};
use crate::tx::args::{parse_tagged_args, TaggedArg};
use crate::tx::plan::{PlanArg, PlanBuilder, PlanCommand, TxPlan};

pub const SUI_SYSTEM_PACKAGE: &str = "0x3";
pub const SUI_SYSTEM_MODULE: &str = "sui_system";
pub const SUI_SYSTEM_STATE_OBJECT_ID: &str =
    "0x0000000000000000000000000000000000000000000000000000000000000005";

/// One recipient and amount (smallest units).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub recipient: AccountAddress,
    pub amount: u64,
}

/// Coin to split payments from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoinSource {
    /// The gas coin (SUI).
    Gas,
    /// `primary`, after merging `merge` into it.
    Coins { primary: String, merge: Vec<String> },
}

impl CoinSource {
    fn place(&self, builder: &mut PlanBuilder) -> StepResult<PlanArg> {
        match self {
            CoinSource::Gas => Ok(PlanArg::GasCoin),
            CoinSource::Coins { primary, merge } => {
                let primary = builder.object(primary, true)?;
                if !merge.is_empty() {
                    let sources = merge
                        .iter()
                        .map(|id| builder.object(id, true))
                        .collect::<StepResult<Vec<_>>>()?;
                    builder.command(PlanCommand::MergeCoins {
                        destination: primary,
                        sources,
                    })?;
                }
                Ok(primary)
            }
        }
    }
}

/// `package::module::function`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveTarget {
    pub package: String,
    pub module: String,
    pub function: String,
}

impl MoveTarget {
    pub fn new(package: &str, module: &str, function: &str) -> Self {
        Self {
            package: package.to_string(),
            module: module.to_string(),
            function: function.to_string(),
        }
    }

    /// Parse `0xPKG::module::function`.
    pub fn parse(target: &str) -> Result<Self, String> {
        let parts: Vec<&str> = target.trim().split("::").collect();
        match parts.as_slice() {
            [package, module, function]
                if !package.is_empty() && !module.is_empty() && !function.is_empty() =>
            {
                Ok(Self::new(package, module, function))
            }
            _ => Err(format!(
                "invalid move target '{target}' (expected 0xPACKAGE::module::function)"
            )),
        }
    }
}

/// Generic Move call with tagged arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveCall {
    pub target: MoveTarget,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<TaggedArg>,
}

impl MoveCall {
    /// Parse from JSON parameter values; argument errors name `arguments[i]`.
    pub fn from_json(target: &str, type_arguments: Vec<String>, arguments: &[Value]) -> StepResult<Self> {
        Ok(Self {
            target: MoveTarget::parse(target).map_err(|m| StepError::validation("target", m))?,
            type_arguments,
            arguments: parse_tagged_args(arguments, "arguments")?,
        })
    }
}

fn require_non_empty<T>(items: &[T], parameter: &str) -> StepResult<()> {
    if items.is_empty() {
        return Err(StepError::validation(parameter, "must not be empty"));
    }
    Ok(())
}

/// Send `amount` MIST from the gas coin to `recipient`.
pub fn transfer(recipient: AccountAddress, amount: u64) -> StepResult<TxPlan> {
    multi_transfer(&CoinSource::Gas, &[Transfer { recipient, amount }])
}

/// Split one coin into several payments in a single transaction.
pub fn multi_transfer(source: &CoinSource, transfers: &[Transfer]) -> StepResult<TxPlan> {
    require_non_empty(transfers, "transfers")?;
    let mut b = PlanBuilder::new();
    let coin = source.place(&mut b)?;
    let amounts = transfers
        .iter()
        .map(|t| b.pure(&t.amount))
        .collect::<StepResult<Vec<_>>>()?;
    let split = b.command(PlanCommand::SplitCoins { coin, amounts })?;
    let PlanArg::Result(split_index) = split else {
        return Err(StepError::build("split did not produce a result"));
    };
    for (i, t) in transfers.iter().enumerate() {
        let recipient = b.pure(&t.recipient)?;
        b.command(PlanCommand::TransferObjects {
            objects: vec![PlanArg::NestedResult(split_index, i as u16)],
            recipient,
        })?;
    }
    Ok(b.finish())
}

/// Send every SUI coin to `recipient`: pay gas with all of them, then hand
/// over the merged gas coin.
pub fn drain_all(recipient: AccountAddress, coins: Vec<String>) -> StepResult<TxPlan> {
    require_non_empty(&coins, "coins")?;
    let mut b = PlanBuilder::new();
    let recipient = b.pure(&recipient)?;
    b.command(PlanCommand::TransferObjects {
        objects: vec![PlanArg::GasCoin],
        recipient,
    })?;
    b.gas_coins(coins);
    Ok(b.finish())
}

/// Merge `sources` into `destination`.
pub fn merge_coins(destination: &str, sources: &[String]) -> StepResult<TxPlan> {
    require_non_empty(sources, "sourceCoinIds")?;
    if sources.iter().any(|s| s == destination) {
        return Err(StepError::validation(
            "sourceCoinIds",
            "must not contain the destination coin",
        ));
    }
    let mut b = PlanBuilder::new();
    let destination = b.object(destination, true)?;
    let sources = sources
        .iter()
        .map(|id| b.object(id, true))
        .collect::<StepResult<Vec<_>>>()?;
    b.command(PlanCommand::MergeCoins {
        destination,
        sources,
    })?;
    Ok(b.finish())
}

/// Split `amounts` off `source` and send the new coins to `recipient`.
pub fn split_coins(source: &CoinSource, amounts: &[u64], recipient: AccountAddress) -> StepResult<TxPlan> {
    require_non_empty(amounts, "amounts")?;
    let mut b = PlanBuilder::new();
    let coin = source.place(&mut b)?;
    let amount_args = amounts
        .iter()
        .map(|a| b.pure(a))
        .collect::<StepResult<Vec<_>>>()?;
    let split = b.command(PlanCommand::SplitCoins {
        coin,
        amounts: amount_args,
    })?;
    let PlanArg::Result(split_index) = split else {
        return Err(StepError::build("split did not produce a result"));
    };
    let recipient = b.pure(&recipient)?;
    b.command(PlanCommand::TransferObjects {
        objects: (0..amounts.len())
            .map(|i| PlanArg::NestedResult(split_index, i as u16))
            .collect(),
        recipient,
    })?;
    Ok(b.finish())
}

/// Single Move call.
pub fn move_call(call: &MoveCall) -> StepResult<TxPlan> {
    let mut b = PlanBuilder::new();
    let mut arguments = Vec::with_capacity(call.arguments.len());
    for (i, arg) in call.arguments.iter().enumerate() {
        match arg {
            TaggedArg::Input(_) | TaggedArg::Result(_) | TaggedArg::NestedResult(..) => {
                return Err(StepError::validation(
                    format!("arguments[{i}]"),
                    "a single Move call cannot reference inputs or results; use ptb.build",
                ));
            }
            other => arguments.push(other.clone().into_plan_arg(&mut b)?),
        }
    }
    b.command(PlanCommand::MoveCall {
        package: call.target.package.clone(),
        module: call.target.module.clone(),
        function: call.target.function.clone(),
        type_arguments: call.type_arguments.clone(),
        arguments,
    })?;
    Ok(b.finish())
}

/// Stake `amount` MIST with `validator` via `0x3::sui_system::request_add_stake`.
pub fn stake(amount: u64, validator: AccountAddress) -> StepResult<TxPlan> {
    let mut b = PlanBuilder::new();
    let system_state = b.object(SUI_SYSTEM_STATE_OBJECT_ID, true)?;
    let amount = b.pure(&amount)?;
    let split = b.command(PlanCommand::SplitCoins {
        coin: PlanArg::GasCoin,
        amounts: vec![amount],
    })?;
    let PlanArg::Result(split_index) = split else {
        return Err(StepError::build("split did not produce a result"));
    };
    let validator = b.pure(&validator)?;
    b.command(PlanCommand::MoveCall {
        package: SUI_SYSTEM_PACKAGE.to_string(),
        module: SUI_SYSTEM_MODULE.to_string(),
        function: "request_add_stake".to_string(),
        type_arguments: vec![],
        arguments: vec![system_state, PlanArg::NestedResult(split_index, 0), validator],
    })?;
    Ok(b.finish())
}

/// Withdraw a `StakedSui` object via `0x3::sui_system::request_withdraw_stake`.
pub fn unstake(staked_sui_id: &str) -> StepResult<TxPlan> {
    let mut b = PlanBuilder::new();
    let system_state = b.object(SUI_SYSTEM_STATE_OBJECT_ID, true)?;
    let staked = b.object(staked_sui_id, true)?;
    b.command(PlanCommand::MoveCall {
        package: SUI_SYSTEM_PACKAGE.to_string(),
        module: SUI_SYSTEM_MODULE.to_string(),
        function: "request_withdraw_stake".to_string(),
        type_arguments: vec![],
        arguments: vec![system_state, staked],
    })?;
    Ok(b.finish())
}

/// Transfer whole objects to `recipient`.
pub fn transfer_objects(object_ids: &[String], recipient: AccountAddress) -> StepResult<TxPlan> {
    require_non_empty(object_ids, "objectIds")?;
    let mut b = PlanBuilder::new();
    let objects = object_ids
        .iter()
        .map(|id| b.object(id, true))
        .collect::<StepResult<Vec<_>>>()?;
    let recipient = b.pure(&recipient)?;
    b.command(PlanCommand::TransferObjects { objects, recipient })?;
    Ok(b.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::plan::PlanInput;
    use serde_json::json;

    fn addr(n: u8) -> AccountAddress {
        let mut bytes = [0u8; 32];
        bytes[31] = n;
        AccountAddress::new(bytes)
    }

    #[test]
    fn test_transfer_plan_shape() {
        let plan = transfer(addr(7), 1_000).unwrap();
        assert_eq!(
            plan.inputs,
            vec![
                PlanInput::Pure(1_000u64.to_le_bytes().to_vec()),
                PlanInput::Pure(addr(7).into_bytes().to_vec()),
            ]
        );
        assert_eq!(
            plan.commands,
            vec![
                PlanCommand::SplitCoins {
                    coin: PlanArg::GasCoin,
                    amounts: vec![PlanArg::Input(0)],
                },
                PlanCommand::TransferObjects {
                    objects: vec![PlanArg::NestedResult(0, 0)],
                    recipient: PlanArg::Input(1),
                },
            ]
        );
        assert!(plan.gas_coins.is_empty());
        plan.check_references().unwrap();
    }

    #[test]
    fn test_multi_transfer_from_coins_merges_first() {
        let source = CoinSource::Coins {
            primary: "0xc1".into(),
            merge: vec!["0xc2".into()],
        };
        let plan = multi_transfer(
            &source,
            &[
                Transfer { recipient: addr(1), amount: 5 },
                Transfer { recipient: addr(2), amount: 6 },
            ],
        )
        .unwrap();
        assert!(matches!(plan.commands[0], PlanCommand::MergeCoins { .. }));
        assert!(matches!(
            plan.commands[1],
            PlanCommand::SplitCoins { coin: PlanArg::Input(0), .. }
        ));
        assert_eq!(plan.commands.len(), 4);
        assert!(matches!(
            &plan.commands[3],
            PlanCommand::TransferObjects { objects, .. } if objects == &vec![PlanArg::NestedResult(1, 1)]
        ));
        plan.check_references().unwrap();

        assert!(multi_transfer(&CoinSource::Gas, &[]).is_err());
    }

    #[test]
    fn test_drain_all_pays_with_every_coin() {
        let plan = drain_all(addr(3), vec!["0xa".into(), "0xb".into()]).unwrap();
        assert_eq!(plan.gas_coins, vec!["0xa".to_string(), "0xb".to_string()]);
        assert_eq!(
            plan.commands,
            vec![PlanCommand::TransferObjects {
                objects: vec![PlanArg::GasCoin],
                recipient: PlanArg::Input(0)
            }]
        );
        assert!(drain_all(addr(3), vec![]).is_err());
    }

    #[test]
    fn test_merge_rejects_self_merge() {
        assert!(merge_coins("0xa", &["0xb".into(), "0xc".into()]).is_ok());
        let err = merge_coins("0xa", &["0xa".into()]).unwrap_err();
        assert!(matches!(err, StepError::Validation { ref parameter, .. } if parameter == "sourceCoinIds"));
    }

    #[test]
    fn test_split_returns_new_coins() {
        let plan = split_coins(&CoinSource::Coins { primary: "0xa".into(), merge: vec![] }, &[1, 2, 3], addr(9)).unwrap();
        assert_eq!(plan.commands.len(), 2);
        assert!(matches!(
            &plan.commands[1],
            PlanCommand::TransferObjects { objects, .. } if objects.len() == 3
        ));
    }

    #[test]
    fn test_stake_and_unstake_target_system_state() {
        let plan = stake(1_000_000_000, addr(4)).unwrap();
        assert_eq!(
            plan.inputs[0],
            PlanInput::Object {
                id: SUI_SYSTEM_STATE_OBJECT_ID.into(),
                mutable: true
            }
        );
        assert!(matches!(
            &plan.commands[1],
            PlanCommand::MoveCall { package, function, arguments, .. }
                if package == "0x3" && function == "request_add_stake" && arguments[1] == PlanArg::NestedResult(0, 0)
        ));

        let plan = unstake("0xdead").unwrap();
        assert_eq!(plan.object_ids(), vec![SUI_SYSTEM_STATE_OBJECT_ID.to_string(), "0xdead".to_string()]);
    }

    #[test]
    fn test_move_call_parses_target_and_args() {
        let call = MoveCall::from_json(
            "0x2::coin::value",
            vec!["0x2::sui::SUI".into()],
            &[json!({"type": "object", "value": "0x6", "mutable": false}), json!({"type": "u64", "value": 1})],
        )
        .unwrap();
        let plan = move_call(&call).unwrap();
        assert_eq!(plan.inputs.len(), 2);
        assert!(matches!(&plan.commands[0], PlanCommand::MoveCall { module, .. } if module == "coin"));

        assert!(matches!(
            MoveCall::from_json("0x2::coin", vec![], &[]),
            Err(StepError::Validation { ref parameter, .. }) if parameter == "target"
        ));
        let with_result = MoveCall::from_json("0x2::m::f", vec![], &[json!({"type": "result", "index": 0})]).unwrap();
        assert!(move_call(&with_result).is_err());
    }
}
