use futures::future::BoxFuture;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use super::{account_address, fetch_required, gas_config, sui_amount, transaction_output};
use crate::error::{StepError, StepResult};
use crate::registry::{Invocation, OperationDef};
use crate::response::{page_value, with_raw};
use crate::schema::{ParamDefault, ParamKind, ParamSpec, CURSOR, DESCENDING, GAS_BUDGET, LIMIT};
use crate::tx::{builders, dry_run, execute, GasEstimate};
use sui_steps_transport::jsonrpc::methods::full_transaction_options;
use sui_steps_transport::jsonrpc::ExecuteRequestType;
use sui_steps_transport::{lookup, Lookup, SuiRequest};
use sui_steps_types::encoding::decode_hex_or_base64;

const RESOURCE: &str = "transaction";

const DIGEST: ParamSpec = ParamSpec::required("digest", ParamKind::Digest, "Transaction digest");
const TX_BYTES: ParamSpec = ParamSpec::required(
    "txBytes",
    ParamKind::String,
    "Base64 BCS-encoded TransactionData",
);

const GET: &[ParamSpec] = &[DIGEST];
const MULTI_GET: &[ParamSpec] = &[ParamSpec::required("digests", ParamKind::List, "Transaction digests")];
const QUERY: &[ParamSpec] = &[
    ParamSpec::optional(
        "filter",
        ParamKind::Json,
        "TransactionFilter, e.g. {\"FromAddress\": \"0x...\"}",
    ),
    CURSOR,
    LIMIT,
    DESCENDING,
];
const TRANSFER_SUI: &[ParamSpec] = &[
    ParamSpec::required("recipient", ParamKind::Address, "Recipient address"),
    ParamSpec::required("amount", ParamKind::Decimal, "Amount in SUI, e.g. 1.5"),
    GAS_BUDGET,
];
const EXECUTE_SIGNED: &[ParamSpec] = &[
    TX_BYTES,
    ParamSpec::required("signatures", ParamKind::List, "Base64 serialized signatures"),
    ParamSpec::optional(
        "requestType",
        ParamKind::String,
        "WaitForLocalExecution or WaitForEffectsCert",
    )
    .with_default(ParamDefault::Text("WaitForLocalExecution")),
];
const DRY_RUN: &[ParamSpec] = &[TX_BYTES];
const WAIT_FOR_CONFIRMATION: &[ParamSpec] = &[
    DIGEST,
    ParamSpec::optional("timeoutMs", ParamKind::Integer, "Give up after this many milliseconds")
        .with_default(ParamDefault::Integer(60_000)),
];
const ESTIMATE_GAS: &[ParamSpec] = &[
    ParamSpec::optional(
        "txBytes",
        ParamKind::String,
        "Base64 TransactionData to estimate; otherwise a SUI transfer is estimated",
    ),
    ParamSpec::optional("recipient", ParamKind::Address, "Transfer recipient"),
    ParamSpec::optional("amount", ParamKind::Decimal, "Transfer amount in SUI"),
    GAS_BUDGET,
];

pub(crate) fn operations() -> Vec<OperationDef> {
    vec![
        OperationDef::new(RESOURCE, "get", "Fetch a transaction block", GET, get),
        OperationDef::new(RESOURCE, "multiGet", "Fetch several transaction blocks", MULTI_GET, multi_get),
        OperationDef::new(RESOURCE, "query", "Query transaction blocks by filter", QUERY, query),
        OperationDef::new(
            RESOURCE,
            "getTotalCount",
            "Total number of transaction blocks on the network",
            &[],
            get_total_count,
        ),
        OperationDef::new(RESOURCE, "transferSui", "Send SUI to an address", TRANSFER_SUI, transfer_sui)
            .requires_signer(),
        OperationDef::new(
            RESOURCE,
            "executeSigned",
            "Submit a transaction signed elsewhere",
            EXECUTE_SIGNED,
            execute_signed,
        ),
        OperationDef::new(RESOURCE, "dryRun", "Simulate serialized TransactionData", DRY_RUN, dry_run_bytes),
        OperationDef::new(
            RESOURCE,
            "waitForConfirmation",
            "Poll until a transaction is indexed or the timeout passes",
            WAIT_FOR_CONFIRMATION,
            wait_for_confirmation,
        ),
        OperationDef::new(
            RESOURCE,
            "estimateGas",
            "Dry-run and report the net gas cost",
            ESTIMATE_GAS,
            estimate_gas,
        )
        .requires_signer(),
    ]
}

fn get(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let digest = inv.params.digest("digest")?;
        fetch_required(
            inv.session,
            &SuiRequest::GetTransactionBlock {
                digest: digest.clone(),
                options: full_transaction_options(),
            },
            format!("transaction {digest}"),
        )
        .await
    })
}

fn multi_get(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let digests = inv.params.list("digests")?;
        if digests.is_empty() {
            return Err(StepError::validation("digests", "must not be empty"));
        }
        inv.session
            .call(&SuiRequest::MultiGetTransactionBlocks {
                digests,
                options: full_transaction_options(),
            })
            .await
    })
}

fn query(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let filter = inv.params.opt_json("filter")?;
        let page = inv.params.page()?;
        let result = inv
            .session
            .call(&SuiRequest::QueryTransactionBlocks {
                query: json!({ "filter": filter, "options": full_transaction_options() }),
                cursor: page.cursor,
                limit: Some(page.limit),
                descending: inv.params.descending()?,
            })
            .await?;
        Ok(page_value(&result))
    })
}

fn get_total_count(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let result = inv.session.call(&SuiRequest::GetTotalTransactionBlocks).await?;
        Ok(with_raw(json!({ "totalTransactions": result.clone() }), result))
    })
}

fn transfer_sui(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let recipient = account_address(&inv.params, "recipient")?;
        let amount = sui_amount(&inv.params, "amount")?;
        let gas = gas_config(&inv.params)?;
        let plan = builders::transfer(recipient, amount)?;
        let result = execute(inv.session, &plan, &gas).await?;
        Ok(transaction_output(result))
    })
}

fn parse_request_type(raw: &str) -> StepResult<ExecuteRequestType> {
    match raw {
        "WaitForLocalExecution" => Ok(ExecuteRequestType::WaitForLocalExecution),
        "WaitForEffectsCert" => Ok(ExecuteRequestType::WaitForEffectsCert),
        other => Err(StepError::validation(
            "requestType",
            format!("expected WaitForLocalExecution or WaitForEffectsCert, got '{other}'"),
        )),
    }
}

fn check_base64_bytes(name: &str, raw: &str) -> StepResult<()> {
    decode_hex_or_base64(raw)
        .map(|_| ())
        .ok_or_else(|| StepError::validation(name, "is not valid base64"))
}

fn execute_signed(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let tx_bytes = inv.params.string("txBytes")?;
        check_base64_bytes("txBytes", &tx_bytes)?;
        let signatures = inv.params.list("signatures")?;
        if signatures.is_empty() {
            return Err(StepError::validation("signatures", "must not be empty"));
        }
        let request_type = parse_request_type(inv.params.str("requestType")?)?;
        let result = inv
            .session
            .call(&SuiRequest::ExecuteTransactionBlock {
                tx_bytes,
                signatures,
                options: full_transaction_options(),
                request_type: Some(request_type),
            })
            .await?;
        Ok(transaction_output(result))
    })
}

fn dry_run_output(result: Value) -> Value {
    let estimate = GasEstimate::from_effects(&result).ok();
    with_raw(
        json!({
            "status": result.pointer("/effects/status/status"),
            "error": result.pointer("/effects/status/error"),
            "gas": estimate.map(|e| e.to_json()),
            "balanceChanges": result.get("balanceChanges"),
            "objectChanges": result.get("objectChanges"),
            "events": result.get("events"),
        }),
        result,
    )
}

fn dry_run_bytes(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let tx_bytes = inv.params.string("txBytes")?;
        check_base64_bytes("txBytes", &tx_bytes)?;
        let result = inv
            .session
            .call(&SuiRequest::DryRunTransactionBlock { tx_bytes })
            .await?;
        Ok(dry_run_output(result))
    })
}

fn wait_for_confirmation(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let digest = inv.params.digest("digest")?;
        let timeout = Duration::from_millis(inv.params.u64("timeoutMs")?);
        let interval = inv.session.settings().poll_interval;
        let deadline = Instant::now() + timeout;
        let request = SuiRequest::GetTransactionBlock {
            digest: digest.clone(),
            options: full_transaction_options(),
        };

        let mut attempts = 0u32;
        loop {
            if inv.cancel.is_cancelled() {
                return Err(StepError::Cancelled);
            }
            attempts += 1;
            if let Lookup::Found(result) = lookup(inv.session.transport().call(&request).await)? {
                debug!(%digest, attempts, "transaction confirmed");
                return Ok(result);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(StepError::Timeout {
                    what: format!("transaction {digest}"),
                    after: timeout,
                });
            }
            let wait = interval.min(deadline - now);
            tokio::select! {
                _ = inv.cancel.cancelled() => return Err(StepError::Cancelled),
                _ = tokio::time::sleep(wait) => {}
            }
        }
    })
}

fn estimate_gas(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let gas = gas_config(&inv.params)?;
        let result = match inv.params.opt_string("txBytes")? {
            Some(tx_bytes) => {
                check_base64_bytes("txBytes", &tx_bytes)?;
                inv.session
                    .call(&SuiRequest::DryRunTransactionBlock { tx_bytes })
                    .await?
            }
            None => {
                if !inv.params.contains("recipient") {
                    return Err(StepError::validation(
                        "recipient",
                        "is required when txBytes is not given",
                    ));
                }
                let recipient = account_address(&inv.params, "recipient")?;
                let amount = sui_amount(&inv.params, "amount")?;
                let plan = builders::transfer(recipient, amount)?;
                let sender = inv.session.require_signer()?.address();
                dry_run(inv.session, sender, &plan, &gas).await?
            }
        };
        let estimate = GasEstimate::from_effects(&result)?;
        Ok(with_raw(
            json!({
                "estimatedGas": estimate.total().to_string(),
                "computationCost": estimate.computation_cost.to_string(),
                "storageCost": estimate.storage_cost.to_string(),
                "storageRebate": estimate.storage_rebate.to_string(),
                "gasBudget": gas.budget.to_string(),
                "status": result.pointer("/effects/status/status"),
            }),
            result,
        ))
    })
}
