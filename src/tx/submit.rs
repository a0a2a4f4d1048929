//! Sign and submit, dry-run, and dev-inspect lowered plans.

use serde_json::{json, Value};
use sui_types::base_types::SuiAddress;
use tracing::info;

use crate::error::{StepError, StepResult};
use crate::session::Session;
use crate::tx::lower::{lower, lower_kind, GasConfig};
use crate::tx::plan::TxPlan;
use sui_steps_transport::jsonrpc::methods::full_transaction_options;
use sui_steps_transport::jsonrpc::ExecuteRequestType;
use sui_steps_transport::SuiRequest;
use sui_steps_types::encoding::base64_encode;

fn bcs_base64<T: serde::Serialize>(value: &T) -> StepResult<String> {
    let bytes = bcs::to_bytes(value).map_err(StepError::build)?;
    Ok(base64_encode(&bytes))
}

/// Lower with the session signer as sender, sign, and execute.
pub async fn execute(session: &Session, plan: &TxPlan, gas: &GasConfig) -> StepResult<Value> {
    let signer = session.require_signer()?;
    let tx_data = lower(session.transport(), signer.address(), plan, gas).await?;
    let signed = signer.sign_transaction(&tx_data)?;
    let result = session
        .call(&SuiRequest::ExecuteTransactionBlock {
            tx_bytes: signed.tx_bytes,
            signatures: vec![signed.signature],
            options: full_transaction_options(),
            request_type: Some(ExecuteRequestType::WaitForLocalExecution),
        })
        .await?;
    info!(
        digest = result.get("digest").and_then(serde_json::Value::as_str).unwrap_or_default(),
        sender = %signer.address(),
        "transaction executed"
    );
    Ok(result)
}

/// Lower for `sender` and simulate with `sui_dryRunTransactionBlock`.
pub async fn dry_run(
    session: &Session,
    sender: SuiAddress,
    plan: &TxPlan,
    gas: &GasConfig,
) -> StepResult<Value> {
    let tx_data = lower(session.transport(), sender, plan, gas).await?;
    session
        .call(&SuiRequest::DryRunTransactionBlock {
            tx_bytes: bcs_base64(&tx_data)?,
        })
        .await
}

/// Evaluate the plan's commands without gas or signature.
pub async fn dev_inspect(session: &Session, sender: &str, plan: &TxPlan) -> StepResult<Value> {
    let kind = lower_kind(session.transport(), plan).await?;
    session
        .call(&SuiRequest::DevInspectTransactionBlock {
            sender: sender.to_string(),
            tx_bytes: bcs_base64(&kind)?,
            gas_price: None,
            epoch: None,
        })
        .await
}

/// Gas figures from a dry-run or execution result's `effects.gasUsed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasEstimate {
    pub computation_cost: u64,
    pub storage_cost: u64,
    pub storage_rebate: u64,
    pub non_refundable_storage_fee: u64,
}

impl GasEstimate {
    pub fn from_effects(result: &Value) -> StepResult<Self> {
        let gas_used = result
            .pointer("/effects/gasUsed")
            .ok_or_else(|| StepError::build("dry run result has no effects.gasUsed"))?;
        let field = |name: &str| -> StepResult<u64> {
            match gas_used.get(name) {
                None | Some(Value::Null) => Ok(0),
                Some(Value::String(s)) => s
                    .parse()
                    .map_err(|_| StepError::build(format!("gasUsed.{name} is not an integer: {s}"))),
                Some(Value::Number(n)) => n
                    .as_u64()
                    .ok_or_else(|| StepError::build(format!("gasUsed.{name} is not an integer: {n}"))),
                Some(other) => Err(StepError::build(format!(
                    "gasUsed.{name} has an unexpected shape: {other}"
                ))),
            }
        };
        Ok(Self {
            computation_cost: field("computationCost")?,
            storage_cost: field("storageCost")?,
            storage_rebate: field("storageRebate")?,
            non_refundable_storage_fee: field("nonRefundableStorageFee")?,
        })
    }

    /// computation + storage - rebate, floored at zero and capped at `u64::MAX`.
    pub fn total(&self) -> u64 {
        self.computation_cost
            .saturating_add(self.storage_cost)
            .saturating_sub(self.storage_rebate)
    }

    pub fn to_json(&self) -> Value {
        json!({
            "computationCost": self.computation_cost.to_string(),
            "storageCost": self.storage_cost.to_string(),
            "storageRebate": self.storage_rebate.to_string(),
            "nonRefundableStorageFee": self.non_refundable_storage_fee.to_string(),
            "totalGas": self.total().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gas_total() {
        let result = json!({"effects": {"gasUsed": {
            "computationCost": "1000000",
            "storageCost": "2000000",
            "storageRebate": "978120",
            "nonRefundableStorageFee": "9880"
        }}});
        let estimate = GasEstimate::from_effects(&result).unwrap();
        assert_eq!(estimate.total(), 2_021_880);
        assert_eq!(estimate.to_json()["totalGas"], "2021880");
    }

    #[test]
    fn test_gas_total_floors_at_zero() {
        let result = json!({"effects": {"gasUsed": {
            "computationCost": "1000",
            "storageCost": "0",
            "storageRebate": "5000"
        }}});
        assert_eq!(GasEstimate::from_effects(&result).unwrap().total(), 0);
    }

    #[test]
    fn test_gas_total_saturates() {
        let estimate = GasEstimate {
            computation_cost: u64::MAX,
            storage_cost: 1,
            storage_rebate: 0,
            non_refundable_storage_fee: 0,
        };
        assert_eq!(estimate.total(), u64::MAX);

        let estimate = GasEstimate {
            storage_rebate: 10,
            ..estimate
        };
        assert_eq!(estimate.total(), u64::MAX - 10);
    }

    #[test]
    fn test_missing_gas_used() {
        assert!(matches!(
            GasEstimate::from_effects(&json!({"effects": {}})),
            Err(StepError::Build(_))
        ));
    }
}
