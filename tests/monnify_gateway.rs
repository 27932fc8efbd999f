use httpmock::prelude::*;
use numhub_backend_rs::modules::payment::gateway::{
    Error, GatewayStatus, InitTransactionPayload, MonnifyClient, MonnifyConfig,
};
use serde_json::json;
use std::str::FromStr;

fn client(server: &MockServer) -> MonnifyClient {
    MonnifyClient::new(MonnifyConfig {
        api_endpoint: server.base_url(),
        api_key: "MK_TEST_KEY".to_string(),
        secret_key: "secret".to_string(),
        contract_code: "1234567890".to_string(),
        redirect_url: "http://localhost:3000/dashboard/wallet".to_string(),
    })
}

async fn mock_login(server: &MockServer) -> httpmock::Mock<'_> {
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/auth/login");
            then.status(200).json_body(json!({
                "requestSuccessful": true,
                "responseMessage": "success",
                "responseCode": "0",
                "responseBody": { "accessToken": "gateway-token", "expiresIn": 3600 }
            }));
        })
        .await
}

#[tokio::test]
async fn access_token_is_reused_between_calls() {
    let server = MockServer::start_async().await;
    let login = mock_login(&server).await;
    let query = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v2/merchant/transactions/query")
                .query_param("paymentReference", "NH-1")
                .header("authorization", "Bearer gateway-token");
            then.status(200).json_body(json!({
                "requestSuccessful": true,
                "responseMessage": "success",
                "responseBody": {
                    "transactionReference": "MNFY|20240601|000001",
                    "paymentReference": "NH-1",
                    "amountPaid": "500.00",
                    "paymentStatus": "PAID"
                }
            }));
        })
        .await;

    let gateway = client(&server);
    let first = gateway.find_by_payment_reference("NH-1").await.unwrap();
    let second = gateway.find_by_payment_reference("NH-1").await.unwrap();

    assert_eq!(first.payment_status, GatewayStatus::Paid);
    assert_eq!(
        second.transaction_reference.as_deref(),
        Some("MNFY|20240601|000001")
    );
    login.assert_hits_async(1).await;
    query.assert_hits_async(2).await;
}

#[tokio::test]
async fn unknown_statuses_do_not_break_decoding() {
    let server = MockServer::start_async().await;
    mock_login(&server).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v2/merchant/transactions/query");
            then.status(200).json_body(json!({
                "requestSuccessful": true,
                "responseMessage": "success",
                "responseBody": {
                    "paymentReference": "NH-1",
                    "paymentStatus": "PENDING_REVIEW"
                }
            }));
        })
        .await;

    let transaction = client(&server)
        .find_by_payment_reference("NH-1")
        .await
        .unwrap();

    assert_eq!(transaction.payment_status, GatewayStatus::Unknown);
    assert_eq!(transaction.amount_paid, None);
}

#[tokio::test]
async fn missing_transactions_are_reported_as_not_found() {
    let server = MockServer::start_async().await;
    mock_login(&server).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v2/merchant/transactions/query");
            then.status(404).json_body(json!({
                "requestSuccessful": false,
                "responseMessage": "Could not find transaction",
                "responseCode": "99"
            }));
        })
        .await;

    let err = client(&server)
        .find_by_payment_reference("NH-404")
        .await
        .unwrap_err();

    assert_eq!(err, Error::NotFound);
}

#[tokio::test]
async fn unsuccessful_envelopes_are_rejected() {
    let server = MockServer::start_async().await;
    mock_login(&server).await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/v1/merchant/transactions/init-transaction");
            then.status(400).json_body(json!({
                "requestSuccessful": false,
                "responseMessage": "Duplicate payment reference",
                "responseCode": "99"
            }));
        })
        .await;

    let err = client(&server)
        .init_transaction(InitTransactionPayload {
            amount: bigdecimal::BigDecimal::from_str("500").unwrap(),
            customer_name: "Ada Obi".to_string(),
            customer_email: "ada@example.com".to_string(),
            payment_reference: "NH-1".to_string(),
            description: "Wallet deposit".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(err, Error::Rejected("Duplicate payment reference".to_string()));
}

#[tokio::test]
async fn checkout_is_initialised_for_the_contract() {
    let server = MockServer::start_async().await;
    mock_login(&server).await;
    let init = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/v1/merchant/transactions/init-transaction")
                .json_body_partial(
                    r#"{
                        "paymentReference": "NH-1",
                        "currencyCode": "NGN",
                        "contractCode": "1234567890",
                        "customerEmail": "ada@example.com"
                    }"#,
                );
            then.status(200).json_body(json!({
                "requestSuccessful": true,
                "responseMessage": "success",
                "responseBody": {
                    "transactionReference": "MNFY|20240601|000001",
                    "paymentReference": "NH-1",
                    "checkoutUrl": "https://sandbox.monnify.com/checkout/MNFY|20240601|000001"
                }
            }));
        })
        .await;

    let checkout = client(&server)
        .init_transaction(InitTransactionPayload {
            amount: bigdecimal::BigDecimal::from_str("500").unwrap(),
            customer_name: "Ada Obi".to_string(),
            customer_email: "ada@example.com".to_string(),
            payment_reference: "NH-1".to_string(),
            description: "Wallet deposit".to_string(),
        })
        .await
        .unwrap();

    init.assert_async().await;
    assert_eq!(checkout.transaction_reference, "MNFY|20240601|000001");
}

#[tokio::test]
async fn rejected_token_forces_a_new_login() {
    let server = MockServer::start_async().await;
    let login = mock_login(&server).await;
    let query = server
        .mock_async(|when, then| {
            when.method(GET).path_contains("/api/v2/transactions/");
            then.status(401).json_body(json!({
                "requestSuccessful": false,
                "responseMessage": "Full authentication is required",
                "responseCode": "99"
            }));
        })
        .await;

    let gateway = client(&server);
    let first = gateway
        .find_by_transaction_reference("MNFY|20240601|000001")
        .await;
    let second = gateway
        .find_by_transaction_reference("MNFY|20240601|000001")
        .await;

    assert!(first.is_err());
    assert!(second.is_err());
    query.assert_hits_async(2).await;
    login.assert_hits_async(2).await;
}
