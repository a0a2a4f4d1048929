//! Per-item runs and continue-on-fail handling.

mod common;

use common::{session, MockTransport};
use serde_json::json;

use sui_steps::{ItemRunner, StepError};

#[tokio::test]
async fn test_records_follow_item_order() {
    let mock = MockTransport::new();
    mock.respond("sui_getTransactionBlock", json!({"digest": "A"}));
    mock.respond("sui_getTransactionBlock", json!({"digest": "B"}));
    let session = session(&mock);

    let records = ItemRunner::new(&session)
        .run(
            "transaction",
            "get",
            vec![json!({"digest": "A"}), json!({"digest": "B"})],
        )
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.success));
    assert_eq!(records[0].item, 0);
    assert_eq!(records[1].result["digest"], "B");
    assert_eq!(records[0].operation, "transaction.get");
    assert!(records[0].request_id.is_some());
    assert_ne!(records[0].request_id, records[1].request_id);
}

#[tokio::test]
async fn test_continue_on_fail_emits_error_record() {
    let mock = MockTransport::new();
    mock.respond("sui_getTransactionBlock", json!({"digest": "A"}));
    let session = session(&mock);

    let records = ItemRunner::new(&session)
        .continue_on_fail(true)
        .run(
            "transaction",
            "get",
            vec![json!({}), json!({"digest": "A"})],
        )
        .await
        .unwrap();
    assert_eq!(records.len(), 2);

    let failed = &records[0];
    assert!(failed.is_error());
    assert_eq!(failed.item, 0);
    let message = failed.error.clone().unwrap();
    assert!(message.contains("'digest'"), "{message}");
    assert_eq!(failed.result["error"], json!(message));
    assert_eq!(failed.error_details.as_ref().unwrap()["parameter"], "digest");

    assert!(records[1].success);
    assert_eq!(mock.calls().len(), 1);
}

#[tokio::test]
async fn test_first_failure_stops_the_run() {
    let mock = MockTransport::new();
    mock.respond("sui_getTransactionBlock", json!({"digest": "A"}));
    let session = session(&mock);

    let err = ItemRunner::new(&session)
        .run(
            "transaction",
            "get",
            vec![json!({"digest": "bad digest"}), json!({"digest": "A"})],
        )
        .await
        .unwrap_err();
    assert_eq!(err.operation, "transaction.get");
    assert!(matches!(err.error, StepError::Validation { ref parameter, .. } if parameter == "digest"));
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn test_error_record_serializes_camel_case() {
    let mock = MockTransport::new();
    mock.fail("sui_getChainIdentifier", -32000, "unavailable");
    let session = session(&mock);

    let records = ItemRunner::new(&session)
        .continue_on_fail(true)
        .run("checkpoint", "getChainIdentifier", vec![json!({})])
        .await
        .unwrap();
    let out = records[0].to_json();
    assert_eq!(out["success"], false);
    assert_eq!(out["errorDetails"]["kind"], "remote");
    assert!(out.get("durationMs").is_some());
}
