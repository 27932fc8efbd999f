use httpmock::prelude::*;
use numhub_backend_rs::{
    client::{ApiClient, Error, SettlementOutcome, SettlementPolicy, TokenPair},
    modules::payment::repository::DepositStatus,
};
use serde_json::{json, Value};
use std::time::Duration;

const REFERENCE: &str = "NH-01J2Z6Q3M8V0Y7R5T4W1X9K2AF";

fn deposit(status: &str) -> Value {
    let amount_paid = match status {
        "PAID" => json!("500"),
        _ => Value::Null,
    };

    json!({
        "id": "01J2Z6Q3M8V0Y7R5T4W1X9K2AG",
        "reference": REFERENCE,
        "user_id": "01J2Z6Q3M8V0Y7R5T4W1X9K2AB",
        "amount": "500",
        "amount_paid": amount_paid,
        "status": status,
        "checkout_url": "https://sandbox.monnify.com/checkout/MNFY|20240601|000001",
        "gateway_reference": "MNFY|20240601|000001",
        "paid_at": null,
        "settled_at": null,
        "created_at": "2024-06-01T10:00:00",
        "updated_at": null
    })
}

fn quick_policy(attempts: u32) -> SettlementPolicy {
    SettlementPolicy {
        attempts,
        interval: Duration::from_millis(10),
    }
}

async fn signed_in_client(server: &MockServer) -> ApiClient {
    let client = ApiClient::new(server.url("/api"));
    client
        .set_tokens(TokenPair {
            access_token: "access-1".to_string(),
            refresh_token: "refresh-1".to_string(),
        })
        .await;
    client
}

#[tokio::test]
async fn paid_deposit_is_confirmed() {
    let server = MockServer::start_async().await;
    let verify = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(format!("/api/payments/verify/{}", REFERENCE))
                .header("authorization", "Bearer access-1");
            then.status(200).json_body(deposit("PAID"));
        })
        .await;

    let client = signed_in_client(&server).await;
    let outcome = client
        .await_settlement(REFERENCE, quick_policy(5))
        .await
        .unwrap();

    match outcome {
        SettlementOutcome::Confirmed(deposit) => {
            assert_eq!(deposit.status, DepositStatus::Paid);
            assert_eq!(deposit.reference, REFERENCE);
        }
        outcome => panic!("Expected a confirmed deposit, got {:?}", outcome),
    }
    verify.assert_hits_async(1).await;
}

#[tokio::test]
async fn reversed_deposit_is_reported_as_failed() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(format!("/api/payments/verify/{}", REFERENCE));
            then.status(200).json_body(deposit("REVERSED"));
        })
        .await;

    let client = signed_in_client(&server).await;
    let outcome = client
        .await_settlement(REFERENCE, quick_policy(5))
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        SettlementOutcome::Failed(DepositStatus::Reversed)
    ));
}

#[tokio::test]
async fn pending_deposit_is_unconfirmed_after_all_attempts() {
    let server = MockServer::start_async().await;
    let verify = server
        .mock_async(|when, then| {
            when.method(GET).path(format!("/api/payments/verify/{}", REFERENCE));
            then.status(200).json_body(deposit("PENDING"));
        })
        .await;

    let client = signed_in_client(&server).await;
    let outcome = client
        .await_settlement(REFERENCE, quick_policy(3))
        .await
        .unwrap();

    assert!(matches!(outcome, SettlementOutcome::Unconfirmed));
    verify.assert_hits_async(3).await;
}

#[tokio::test]
async fn gateway_outages_count_as_attempts() {
    let server = MockServer::start_async().await;
    let verify = server
        .mock_async(|when, then| {
            when.method(GET).path(format!("/api/payments/verify/{}", REFERENCE));
            then.status(502)
                .json_body(json!({ "error": "Payment gateway unavailable" }));
        })
        .await;

    let client = signed_in_client(&server).await;
    let outcome = client
        .await_settlement(REFERENCE, quick_policy(4))
        .await
        .unwrap();

    assert!(matches!(outcome, SettlementOutcome::Unconfirmed));
    verify.assert_hits_async(4).await;
}

#[tokio::test]
async fn session_errors_stop_polling() {
    let server = MockServer::start_async().await;
    let verify = server
        .mock_async(|when, then| {
            when.method(GET).path(format!("/api/payments/verify/{}", REFERENCE));
            then.status(403).json_body(json!({ "error": "Forbidden" }));
        })
        .await;

    let client = signed_in_client(&server).await;
    let err = client
        .await_settlement(REFERENCE, quick_policy(5))
        .await
        .unwrap_err();

    assert_eq!(err, Error::Forbidden("Forbidden".to_string()));
    verify.assert_hits_async(1).await;
}
