//! Build, sign and submit against a scripted transport.

mod common;

use common::{signing_session, test_signer, MockTransport};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use sui_steps::execute;
use sui_steps_types::encoding::try_base64_decode;
use sui_types::transaction::{TransactionData, TransactionDataAPI, TransactionKind};

/// Base58 of 32 zero bytes.
const DIGEST: &str = "11111111111111111111111111111111";

fn id(n: u16) -> String {
    format!("0x{:0>64}", format!("{n:x}"))
}

fn coin(n: u16, version: u64, balance: &str) -> Value {
    json!({
        "coinObjectId": id(n),
        "version": version.to_string(),
        "digest": DIGEST,
        "balance": balance,
    })
}

fn owned_entry(n: u16, owner: &str) -> Value {
    json!({"data": {
        "objectId": id(n),
        "version": "8",
        "digest": DIGEST,
        "owner": {"AddressOwner": owner},
    }})
}

fn executed(digest: &str, status: Value) -> Value {
    json!({
        "digest": digest,
        "effects": {
            "status": status,
            "gasUsed": {
                "computationCost": "1000000",
                "storageCost": "1976000",
                "storageRebate": "978120",
                "nonRefundableStorageFee": "9880"
            }
        },
        "balanceChanges": [{"owner": {"AddressOwner": "0x2"}, "amount": "500000000"}],
        "checkpoint": "1200"
    })
}

/// The signed transaction the mock received, decoded.
fn submitted(mock: &MockTransport) -> (TransactionData, Vec<u8>) {
    let calls = mock.calls();
    let (method, params) = calls.last().unwrap();
    assert_eq!(method, "sui_executeTransactionBlock");
    assert_eq!(params[3], "WaitForLocalExecution");
    assert_eq!(params[2]["showEffects"], true);

    let tx_bytes = try_base64_decode(params[0].as_str().unwrap()).unwrap();
    let tx: TransactionData = bcs::from_bytes(&tx_bytes).unwrap();
    let signature = try_base64_decode(params[1][0].as_str().unwrap()).unwrap();
    (tx, signature)
}

#[tokio::test]
async fn test_transfer_sui_signs_and_executes() {
    let mock = MockTransport::new();
    // The first page only holds dust, so gas selection has to follow the cursor.
    mock.respond(
        "suix_getCoins",
        json!({"data": [coin(0xa1, 3, "100")], "nextCursor": "c1", "hasNextPage": true}),
    );
    mock.respond(
        "suix_getCoins",
        json!({"data": [coin(0xa2, 4, "50000000")], "nextCursor": null, "hasNextPage": false}),
    );
    mock.respond("suix_getReferenceGasPrice", json!("750"));
    mock.respond(
        "sui_executeTransactionBlock",
        executed("D1", json!({"status": "success"})),
    );
    let session = signing_session(&mock);

    let out = execute(
        &session,
        "transaction",
        "transferSui",
        json!({"recipient": "0x2", "amount": "0.5"}),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(
        mock.methods(),
        vec![
            "suix_getCoins",
            "suix_getCoins",
            "suix_getReferenceGasPrice",
            "sui_executeTransactionBlock"
        ]
    );
    let calls = mock.calls();
    assert_eq!(calls[0].1[1], "0x2::sui::SUI");
    assert_eq!(calls[0].1[2], Value::Null);
    assert_eq!(calls[1].1[2], "c1");

    let signer = test_signer();
    let (tx, signature) = submitted(&mock);
    assert_eq!(tx.sender(), signer.address());
    assert_eq!(tx.gas_budget(), 10_000_000);
    assert_eq!(tx.gas_price(), 750);
    let gas_ids: Vec<String> = tx.gas().iter().map(|(oid, _, _)| oid.to_string()).collect();
    assert_eq!(gas_ids, vec![id(0xa1), id(0xa2)]);
    match tx.kind() {
        TransactionKind::ProgrammableTransaction(pt) => assert_eq!(pt.commands.len(), 2),
        other => panic!("unexpected transaction kind {other:?}"),
    }
    // ed25519: flag, 64-byte signature, 32-byte public key.
    assert_eq!(signature.len(), 97);
    assert_eq!(signature[0], 0x00);

    assert_eq!(out["digest"], "D1");
    assert_eq!(out["status"], "success");
    assert_eq!(out["error"], Value::Null);
    assert_eq!(out["checkpoint"], "1200");
    assert_eq!(out["gasUsed"]["computationCost"], "1000000");
    assert_eq!(out["raw"]["digest"], "D1");
}

#[tokio::test]
async fn test_multi_transfer_reports_failed_effects() {
    let signer = test_signer();
    let owner = signer.address_string();
    let usdc = "0xdba3::usdc::USDC";

    let mock = MockTransport::new();
    mock.respond(
        "suix_getCoins",
        json!({
            "data": [coin(0xb1, 5, "700"), coin(0xb2, 6, "600")],
            "nextCursor": null,
            "hasNextPage": false
        }),
    );
    mock.respond(
        "suix_getCoins",
        json!({"data": [coin(0xa2, 4, "90000000")], "nextCursor": null, "hasNextPage": false}),
    );
    mock.respond(
        "sui_multiGetObjects",
        json!([owned_entry(0xb1, &owner), owned_entry(0xb2, &owner)]),
    );
    mock.respond("suix_getReferenceGasPrice", json!("1000"));
    mock.respond(
        "sui_executeTransactionBlock",
        executed(
            "D2",
            json!({"status": "failure", "error": "InsufficientCoinBalance in command 1"}),
        ),
    );
    let session = signing_session(&mock);

    let out = execute(
        &session,
        "coin",
        "multiTransfer",
        json!({
            "coinType": usdc,
            "recipients": [
                {"address": "0x5", "amount": "400"},
                {"address": "0x6", "amount": 600}
            ]
        }),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(
        mock.methods(),
        vec![
            "suix_getCoins",
            "sui_multiGetObjects",
            "suix_getCoins",
            "suix_getReferenceGasPrice",
            "sui_executeTransactionBlock"
        ]
    );
    let calls = mock.calls();
    assert_eq!(calls[0].1[0], json!(owner));
    assert_eq!(calls[0].1[1], usdc);
    assert_eq!(calls[1].1[0], json!([id(0xb1), id(0xb2)]));

    let (tx, _) = submitted(&mock);
    assert_eq!(tx.sender(), signer.address());
    assert_eq!(tx.gas_price(), 1000);
    assert_eq!(tx.gas().len(), 1);
    match tx.kind() {
        // merge, split, and one transfer per recipient
        TransactionKind::ProgrammableTransaction(pt) => assert_eq!(pt.commands.len(), 4),
        other => panic!("unexpected transaction kind {other:?}"),
    }

    // A failed execution is still a completed step; the status says why.
    assert_eq!(out["digest"], "D2");
    assert_eq!(out["status"], "failure");
    assert_eq!(out["error"], "InsufficientCoinBalance in command 1");
    assert_eq!(out["raw"]["effects"]["status"]["status"], "failure");
}

#[tokio::test]
async fn test_gas_coins_used_as_inputs_are_skipped() {
    let signer = test_signer();
    let owner = signer.address_string();

    let mock = MockTransport::new();
    mock.respond(
        "suix_getCoins",
        json!({
            "data": [coin(0xc1, 2, "90000000"), coin(0xc2, 3, "90000000")],
            "nextCursor": null,
            "hasNextPage": false
        }),
    );
    mock.respond("sui_multiGetObjects", json!([owned_entry(0xc1, &owner)]));
    mock.respond("suix_getReferenceGasPrice", json!("1000"));
    mock.respond(
        "sui_executeTransactionBlock",
        executed("D3", json!({"status": "success"})),
    );
    let session = signing_session(&mock);

    execute(
        &session,
        "object",
        "transfer",
        json!({"objectIds": [id(0xc1)], "recipient": "0x7"}),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    let (tx, _) = submitted(&mock);
    let gas_ids: Vec<String> = tx.gas().iter().map(|(oid, _, _)| oid.to_string()).collect();
    assert_eq!(gas_ids, vec![id(0xc2)]);
}
