use futures::future::BoxFuture;
use serde_json::{json, Value};

use crate::error::{StepError, StepResult};
use crate::registry::{Invocation, OperationDef};
use crate::response::{page_value, with_raw};
use crate::schema::{ParamDefault, ParamKind, ParamSpec, CURSOR, DESCENDING, LIMIT};
use sui_steps_transport::jsonrpc::methods::{full_object_options, full_transaction_options};
use sui_steps_transport::SuiRequest;
use sui_steps_types::units::{format_balance, parse_smallest_unit, SUI_DECIMALS};
use sui_steps_types::SUI_COIN_TYPE;

const RESOURCE: &str = "account";

const OWNER: ParamSpec = ParamSpec::signer_address("owner", "Account address; defaults to the signer");
const COIN_TYPE: ParamSpec = ParamSpec::optional("coinType", ParamKind::String, "Coin type")
    .with_default(ParamDefault::Text(SUI_COIN_TYPE));

const GET_BALANCE: &[ParamSpec] = &[OWNER, COIN_TYPE];
const GET_ALL_BALANCES: &[ParamSpec] = &[OWNER];
const GET_OWNED_OBJECTS: &[ParamSpec] = &[
    OWNER,
    ParamSpec::optional(
        "filter",
        ParamKind::Json,
        "SuiObjectDataFilter, e.g. {\"StructType\": \"0x2::coin::Coin<0x2::sui::SUI>\"}",
    ),
    CURSOR,
    LIMIT,
];
const GET_TRANSACTIONS: &[ParamSpec] = &[
    OWNER,
    ParamSpec::optional("direction", ParamKind::String, "'from' (sent) or 'to' (received)")
        .with_default(ParamDefault::Text("from")),
    CURSOR,
    LIMIT,
    DESCENDING,
];
const REQUEST_FAUCET: &[ParamSpec] = &[ParamSpec::signer_address(
    "address",
    "Recipient of test SUI; defaults to the signer",
)];

pub(crate) fn operations() -> Vec<OperationDef> {
    vec![
        OperationDef::new(
            RESOURCE,
            "getAddress",
            "Address derived from the configured signing key",
            &[],
            get_address,
        )
        .requires_signer(),
        OperationDef::new(RESOURCE, "getBalance", "Balance of one coin type", GET_BALANCE, get_balance),
        OperationDef::new(
            RESOURCE,
            "getAllBalances",
            "Balances of every coin type held",
            GET_ALL_BALANCES,
            get_all_balances,
        ),
        OperationDef::new(
            RESOURCE,
            "getOwnedObjects",
            "Objects owned by an address",
            GET_OWNED_OBJECTS,
            get_owned_objects,
        ),
        OperationDef::new(
            RESOURCE,
            "getTransactions",
            "Transactions sent from or received by an address",
            GET_TRANSACTIONS,
            get_transactions,
        ),
        OperationDef::new(
            RESOURCE,
            "requestFaucet",
            "Request test SUI from the network faucet",
            REQUEST_FAUCET,
            request_faucet,
        )
        .signer_when_missing("address"),
    ]
}

fn get_address(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let signer = inv.session.require_signer()?;
        Ok(json!({
            "address": signer.address_string(),
            "keyScheme": signer.scheme().as_str(),
            "network": inv.session.network().as_str(),
        }))
    })
}

fn get_balance(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let owner = inv.params.address("owner")?;
        let coin_type = inv.params.string("coinType")?;
        let result = inv
            .session
            .call(&SuiRequest::GetBalance {
                owner: owner.clone(),
                coin_type: Some(coin_type.clone()),
            })
            .await?;

        let total = result
            .get("totalBalance")
            .and_then(Value::as_str)
            .unwrap_or("0")
            .to_string();
        // Decimals are only known without a metadata lookup for SUI itself.
        let formatted = if coin_type == SUI_COIN_TYPE {
            parse_smallest_unit(&total)
                .ok()
                .map(|amount| format_balance(&amount, SUI_DECIMALS, Some("SUI")))
        } else {
            None
        };
        Ok(with_raw(
            json!({
                "owner": owner,
                "coinType": result.get("coinType").cloned().unwrap_or(json!(coin_type)),
                "totalBalance": total,
                "coinObjectCount": result.get("coinObjectCount"),
                "formatted": formatted,
            }),
            result,
        ))
    })
}

fn get_all_balances(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let owner = inv.params.address("owner")?;
        let result = inv
            .session
            .call(&SuiRequest::GetAllBalances {
                owner: owner.clone(),
            })
            .await?;
        let count = result.as_array().map_or(0, Vec::len);
        Ok(with_raw(
            json!({ "owner": owner, "balances": result.clone(), "count": count }),
            result,
        ))
    })
}

fn get_owned_objects(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let owner = inv.params.address("owner")?;
        let filter = inv.params.opt_json("filter")?;
        let page = inv.params.page()?;
        let result = inv
            .session
            .call(&SuiRequest::GetOwnedObjects {
                owner,
                query: json!({ "filter": filter, "options": full_object_options() }),
                cursor: page.cursor,
                limit: Some(page.limit),
            })
            .await?;
        Ok(page_value(&result))
    })
}

fn get_transactions(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let owner = inv.params.address("owner")?;
        let filter = match inv.params.str("direction")?.to_lowercase().as_str() {
            "from" => json!({ "FromAddress": owner }),
            "to" => json!({ "ToAddress": owner }),
            other => {
                return Err(StepError::validation(
                    "direction",
                    format!("expected 'from' or 'to', got '{other}'"),
                ))
            }
        };
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

fn request_faucet(inv: Invocation<'_>) -> BoxFuture<'_, StepResult> {
    Box::pin(async move {
        let address = inv.params.address("address")?;
        let network = inv.session.network();
        if network.is_production() {
            return Err(StepError::Precondition(format!(
                "faucet is not available on {network}"
            )));
        }
        let faucet = inv.session.faucet().ok_or_else(|| {
            StepError::Precondition(format!("no faucet URL configured for {network}"))
        })?;
        let result = faucet.request(&address).await?;
        Ok(with_raw(
            json!({ "address": address, "network": network.as_str(), "faucet": faucet.url() }),
            result,
        ))
    })
}

