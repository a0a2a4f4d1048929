//! Typed catalog of the Sui JSON-RPC methods used by the steps.
//!
//! Each variant owns its parameters by name; [`SuiRequest::params`] renders the
//! positional array in the order the node expects, with `null` for omitted
//! optionals. Cursors are opaque [`Value`]s and are sent exactly as received.

use serde_json::{json, Value};

/// `sui_executeTransactionBlock` request type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecuteRequestType {
    #[default]
    WaitForLocalExecution,
    WaitForEffectsCert,
}

impl ExecuteRequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecuteRequestType::WaitForLocalExecution => "WaitForLocalExecution",
            ExecuteRequestType::WaitForEffectsCert => "WaitForEffectsCert",
        }
    }
}

/// Object data options requesting everything the steps reshape.
pub fn full_object_options() -> Value {
    json!({
        "showType": true,
        "showOwner": true,
        "showPreviousTransaction": true,
        "showDisplay": true,
        "showContent": true,
        "showBcs": false,
        "showStorageRebate": true
    })
}

/// Object data options for reference resolution only.
pub fn owner_object_options() -> Value {
    json!({ "showType": true, "showOwner": true })
}

/// Transaction block response options requesting everything the steps reshape.
pub fn full_transaction_options() -> Value {
    json!({
        "showInput": true,
        "showRawInput": false,
        "showEffects": true,
        "showEvents": true,
        "showObjectChanges": true,
        "showBalanceChanges": true
    })
}

fn opt<T: Into<Value>>(value: Option<T>) -> Value {
    value.map(Into::into).unwrap_or(Value::Null)
}

/// One remote call, with typed parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum SuiRequest {
    // --- balances & coins ---
    GetBalance {
        owner: String,
        coin_type: Option<String>,
    },
    GetAllBalances {
        owner: String,
    },
    GetCoins {
        owner: String,
        coin_type: Option<String>,
        cursor: Value,
        limit: Option<u32>,
    },
    GetAllCoins {
        owner: String,
        cursor: Value,
        limit: Option<u32>,
    },
    GetCoinMetadata {
        coin_type: String,
    },
    GetTotalSupply {
        coin_type: String,
    },

    // --- objects ---
    GetObject {
        object_id: String,
        options: Value,
    },
    MultiGetObjects {
        object_ids: Vec<String>,
        options: Value,
    },
    TryGetPastObject {
        object_id: String,
        version: u64,
        options: Value,
    },
    GetOwnedObjects {
        owner: String,
        query: Value,
        cursor: Value,
        limit: Option<u32>,
    },
    GetDynamicFields {
        parent_id: String,
        cursor: Value,
        limit: Option<u32>,
    },
    GetDynamicFieldObject {
        parent_id: String,
        name: Value,
    },

    // --- transactions ---
    GetTransactionBlock {
        digest: String,
        options: Value,
    },
    MultiGetTransactionBlocks {
        digests: Vec<String>,
        options: Value,
    },
    QueryTransactionBlocks {
        query: Value,
        cursor: Value,
        limit: Option<u32>,
        descending: bool,
    },
    GetTotalTransactionBlocks,
    ExecuteTransactionBlock {
        tx_bytes: String,
        signatures: Vec<String>,
        options: Value,
        request_type: Option<ExecuteRequestType>,
    },
    DryRunTransactionBlock {
        tx_bytes: String,
    },
    DevInspectTransactionBlock {
        sender: String,
        tx_bytes: String,
        gas_price: Option<u64>,
        epoch: Option<u64>,
    },

    // --- move introspection ---
    GetNormalizedMoveModule {
        package: String,
        module: String,
    },
    GetNormalizedMoveModulesByPackage {
        package: String,
    },
    GetNormalizedMoveFunction {
        package: String,
        module: String,
        function: String,
    },
    GetNormalizedMoveStruct {
        package: String,
        module: String,
        name: String,
    },
    GetMoveFunctionArgTypes {
        package: String,
        module: String,
        function: String,
    },

    // --- staking & system ---
    GetStakes {
        owner: String,
    },
    GetStakesByIds {
        staked_sui_ids: Vec<String>,
    },
    GetLatestSuiSystemState,
    GetValidatorsApy,
    GetReferenceGasPrice,
    GetProtocolConfig {
        version: Option<u64>,
    },

    // --- events ---
    QueryEvents {
        query: Value,
        cursor: Value,
        limit: Option<u32>,
        descending: bool,
    },
    GetEvents {
        digest: String,
    },

    // --- checkpoints ---
    GetCheckpoint {
        id: String,
    },
    GetCheckpoints {
        cursor: Value,
        limit: Option<u32>,
        descending: bool,
    },
    GetLatestCheckpointSequenceNumber,
    GetChainIdentifier,

    // --- name service ---
    ResolveNameServiceAddress {
        name: String,
    },
    ResolveNameServiceNames {
        address: String,
        cursor: Value,
        limit: Option<u32>,
    },

    // --- discovery ---
    RpcDiscover,

    // --- subscriptions (WebSocket only) ---
    SubscribeEvent {
        filter: Value,
    },
    SubscribeTransaction {
        filter: Value,
    },
    UnsubscribeEvent {
        subscription: Value,
    },
    UnsubscribeTransaction {
        subscription: Value,
    },
}

impl SuiRequest {
    /// Wire method name.
    pub fn method(&self) -> &'static str {
        use SuiRequest::*;
        match self {
            GetBalance { .. } => "suix_getBalance",
            GetAllBalances { .. } => "suix_getAllBalances",
            GetCoins { .. } => "suix_getCoins",
            GetAllCoins { .. } => "suix_getAllCoins",
            GetCoinMetadata { .. } => "suix_getCoinMetadata",
            GetTotalSupply { .. } => "suix_getTotalSupply",
            GetObject { .. } => "sui_getObject",
            MultiGetObjects { .. } => "sui_multiGetObjects",
            TryGetPastObject { .. } => "sui_tryGetPastObject",
            GetOwnedObjects { .. } => "suix_getOwnedObjects",
            GetDynamicFields { .. } => "suix_getDynamicFields",
            GetDynamicFieldObject { .. } => "suix_getDynamicFieldObject",
            GetTransactionBlock { .. } => "sui_getTransactionBlock",
            MultiGetTransactionBlocks { .. } => "sui_multiGetTransactionBlocks",
            QueryTransactionBlocks { .. } => "suix_queryTransactionBlocks",
            GetTotalTransactionBlocks => "sui_getTotalTransactionBlocks",
            ExecuteTransactionBlock { .. } => "sui_executeTransactionBlock",
            DryRunTransactionBlock { .. } => "sui_dryRunTransactionBlock",
            DevInspectTransactionBlock { .. } => "sui_devInspectTransactionBlock",
            GetNormalizedMoveModule { .. } => "sui_getNormalizedMoveModule",
            GetNormalizedMoveModulesByPackage { .. } => "sui_getNormalizedMoveModulesByPackage",
            GetNormalizedMoveFunction { .. } => "sui_getNormalizedMoveFunction",
            GetNormalizedMoveStruct { .. } => "sui_getNormalizedMoveStruct",
            GetMoveFunctionArgTypes { .. } => "sui_getMoveFunctionArgTypes",
            GetStakes { .. } => "suix_getStakes",
            GetStakesByIds { .. } => "suix_getStakesByIds",
            GetLatestSuiSystemState => "suix_getLatestSuiSystemState",
            GetValidatorsApy => "suix_getValidatorsApy",
            GetReferenceGasPrice => "suix_getReferenceGasPrice",
            GetProtocolConfig { .. } => "sui_getProtocolConfig",
            QueryEvents { .. } => "suix_queryEvents",
            GetEvents { .. } => "sui_getEvents",
            GetCheckpoint { .. } => "sui_getCheckpoint",
            GetCheckpoints { .. } => "sui_getCheckpoints",
            GetLatestCheckpointSequenceNumber => "sui_getLatestCheckpointSequenceNumber",
            GetChainIdentifier => "sui_getChainIdentifier",
            ResolveNameServiceAddress { .. } => "suix_resolveNameServiceAddress",
            ResolveNameServiceNames { .. } => "suix_resolveNameServiceNames",
            RpcDiscover => "rpc.discover",
            SubscribeEvent { .. } => "suix_subscribeEvent",
            SubscribeTransaction { .. } => "suix_subscribeTransaction",
            UnsubscribeEvent { .. } => "suix_unsubscribeEvent",
            UnsubscribeTransaction { .. } => "suix_unsubscribeTransaction",
        }
    }

    /// Positional parameter array.
    pub fn params(&self) -> Value {
        use SuiRequest::*;
        match self {
            GetBalance { owner, coin_type } => json!([owner, coin_type]),
            GetAllBalances { owner } => json!([owner]),
            GetCoins {
                owner,
                coin_type,
                cursor,
                limit,
            } => json!([owner, coin_type, cursor, opt(*limit)]),
            GetAllCoins {
                owner,
                cursor,
                limit,
            } => json!([owner, cursor, opt(*limit)]),
            GetCoinMetadata { coin_type } => json!([coin_type]),
            GetTotalSupply { coin_type } => json!([coin_type]),

            GetObject { object_id, options } => json!([object_id, options]),
            MultiGetObjects {
                object_ids,
                options,
            } => json!([object_ids, options]),
            TryGetPastObject {
                object_id,
                version,
                options,
            } => json!([object_id, version, options]),
            GetOwnedObjects {
                owner,
                query,
                cursor,
                limit,
            } => json!([owner, query, cursor, opt(*limit)]),
            GetDynamicFields {
                parent_id,
                cursor,
                limit,
            } => json!([parent_id, cursor, opt(*limit)]),
            GetDynamicFieldObject { parent_id, name } => json!([parent_id, name]),

            GetTransactionBlock { digest, options } => json!([digest, options]),
            MultiGetTransactionBlocks { digests, options } => json!([digests, options]),
            QueryTransactionBlocks {
                query,
                cursor,
                limit,
                descending,
            } => json!([query, cursor, opt(*limit), descending]),
            GetTotalTransactionBlocks => json!([]),
            ExecuteTransactionBlock {
                tx_bytes,
                signatures,
                options,
                request_type,
            } => json!([
                tx_bytes,
                signatures,
                options,
                opt(request_type.map(|r| r.as_str()))
            ]),
            DryRunTransactionBlock { tx_bytes } => json!([tx_bytes]),
            DevInspectTransactionBlock {
                sender,
                tx_bytes,
                gas_price,
                epoch,
            } => json!([
                sender,
                tx_bytes,
                opt(gas_price.map(|p| p.to_string())),
                opt(epoch.map(|e| e.to_string()))
            ]),

            GetNormalizedMoveModule { package, module } => json!([package, module]),
            GetNormalizedMoveModulesByPackage { package } => json!([package]),
            GetNormalizedMoveFunction {
                package,
                module,
                function,
            } => json!([package, module, function]),
            GetNormalizedMoveStruct {
                package,
                module,
                name,
            } => json!([package, module, name]),
            GetMoveFunctionArgTypes {
                package,
                module,
                function,
            } => json!([package, module, function]),

            GetStakes { owner } => json!([owner]),
            GetStakesByIds { staked_sui_ids } => json!([staked_sui_ids]),
            GetLatestSuiSystemState => json!([]),
            GetValidatorsApy => json!([]),
            GetReferenceGasPrice => json!([]),
            GetProtocolConfig { version } => json!([opt(version.map(|v| v.to_string()))]),

            QueryEvents {
                query,
                cursor,
                limit,
                descending,
            } => json!([query, cursor, opt(*limit), descending]),
            GetEvents { digest } => json!([digest]),

            GetCheckpoint { id } => json!([id]),
            GetCheckpoints {
                cursor,
                limit,
                descending,
            } => json!([cursor, opt(*limit), descending]),
            GetLatestCheckpointSequenceNumber => json!([]),
            GetChainIdentifier => json!([]),

            ResolveNameServiceAddress { name } => json!([name]),
            ResolveNameServiceNames {
                address,
                cursor,
                limit,
            } => json!([address, cursor, opt(*limit)]),

            RpcDiscover => json!([]),

            SubscribeEvent { filter } => json!([filter]),
            SubscribeTransaction { filter } => json!([filter]),
            UnsubscribeEvent { subscription } => json!([subscription]),
            UnsubscribeTransaction { subscription } => json!([subscription]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_params_render_as_null() {
        let req = SuiRequest::GetBalance {
            owner: "0xa".into(),
            coin_type: None,
        };
        assert_eq!(req.method(), "suix_getBalance");
        assert_eq!(req.params(), json!(["0xa", null]));
    }

    #[test]
    fn test_cursor_sent_verbatim() {
        let cursor = json!({"txDigest": "Abc", "eventSeq": "7"});
        let req = SuiRequest::QueryEvents {
            query: json!({"Sender": "0xa"}),
            cursor: cursor.clone(),
            limit: Some(10),
            descending: true,
        };
        assert_eq!(req.params(), json!([{"Sender": "0xa"}, cursor, 10, true]));
    }

    #[test]
    fn test_execute_params_order() {
        let req = SuiRequest::ExecuteTransactionBlock {
            tx_bytes: "AAA=".into(),
            signatures: vec!["BBB=".into()],
            options: json!({"showEffects": true}),
            request_type: Some(ExecuteRequestType::WaitForLocalExecution),
        };
        assert_eq!(
            req.params(),
            json!(["AAA=", ["BBB="], {"showEffects": true}, "WaitForLocalExecution"])
        );
    }

    #[test]
    fn test_dev_inspect_stringifies_numbers() {
        let req = SuiRequest::DevInspectTransactionBlock {
            sender: "0xa".into(),
            tx_bytes: "AAA=".into(),
            gas_price: Some(1000),
            epoch: None,
        };
        assert_eq!(req.params(), json!(["0xa", "AAA=", "1000", null]));
    }

    #[test]
    fn test_parameterless_methods() {
        for req in [
            SuiRequest::GetReferenceGasPrice,
            SuiRequest::GetChainIdentifier,
            SuiRequest::GetLatestSuiSystemState,
        ] {
            assert_eq!(req.params(), json!([]));
        }
        assert_eq!(
            SuiRequest::GetProtocolConfig { version: Some(42) }.params(),
            json!(["42"])
        );
    }
}
