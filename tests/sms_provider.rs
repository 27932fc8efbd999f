use httpmock::prelude::*;
use numhub_backend_rs::modules::number::provider::{
    Error, ProviderStatus, SmsProvider, StatusUpdate,
};
use serde_json::json;

const HANDLER: &str = "/stubs/handler_api.php";

fn provider(server: &MockServer) -> SmsProvider {
    SmsProvider::new(server.base_url(), "test-key".to_string())
}

#[tokio::test]
async fn number_is_assigned() {
    let server = MockServer::start_async().await;
    let get_number = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(HANDLER)
                .query_param("api_key", "test-key")
                .query_param("action", "getNumber")
                .query_param("service", "tg")
                .query_param("country", "6");
            then.status(200).body("ACCESS_NUMBER:918273645:6281234567890");
        })
        .await;

    let assignment = provider(&server).get_number(6, "tg").await.unwrap();

    get_number.assert_async().await;
    assert_eq!(assignment.activation_id, "918273645");
    assert_eq!(assignment.phone_number, "6281234567890");
}

#[tokio::test]
async fn empty_stock_is_reported() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(HANDLER).query_param("action", "getNumber");
            then.status(200).body("NO_NUMBERS");
        })
        .await;

    let err = provider(&server).get_number(6, "tg").await.unwrap_err();

    assert_eq!(err, Error::NoNumbers);
}

#[tokio::test]
async fn received_code_is_read_from_status() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path(HANDLER)
                .query_param("action", "getStatus")
                .query_param("id", "918273645");
            then.status(200).body("STATUS_OK:48213");
        })
        .await;

    let status = provider(&server).get_status("918273645").await.unwrap();

    assert_eq!(status, ProviderStatus::CodeReceived("48213".to_string()));
    assert_eq!(status.code(), Some("48213"));
}

#[tokio::test]
async fn cancel_sends_status_eight() {
    let server = MockServer::start_async().await;
    let cancel = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(HANDLER)
                .query_param("action", "setStatus")
                .query_param("id", "918273645")
                .query_param("status", "8");
            then.status(200).body("ACCESS_CANCEL");
        })
        .await;

    provider(&server)
        .set_status("918273645", StatusUpdate::Cancel)
        .await
        .unwrap();

    cancel.assert_async().await;
}

#[tokio::test]
async fn ready_for_sms_sends_status_one() {
    let server = MockServer::start_async().await;
    let ready = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(HANDLER)
                .query_param("action", "setStatus")
                .query_param("id", "918273645")
                .query_param("status", "1");
            then.status(200).body("ACCESS_READY");
        })
        .await;

    provider(&server)
        .set_status("918273645", StatusUpdate::ReadyForSms)
        .await
        .unwrap();

    ready.assert_async().await;
}

#[tokio::test]
async fn prices_are_flattened_per_country_and_service() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(HANDLER).query_param("action", "getPrices");
            then.status(200).json_body(json!({
                "0": { "tg": { "cost": 12.5, "count": 140 }, "wa": { "cost": "20", "count": "0" } },
                "6": { "tg": { "cost": 8, "count": 3 } }
            }));
        })
        .await;

    let mut prices = provider(&server).get_prices().await.unwrap();
    prices.sort_by(|a, b| {
        (a.country_id, a.service_code.as_str()).cmp(&(b.country_id, b.service_code.as_str()))
    });

    assert_eq!(prices.len(), 3);
    assert_eq!(prices[0].service_code, "tg");
    assert_eq!(prices[0].cost.to_string(), "12.5");
    assert_eq!(prices[0].count, 140);
    assert_eq!(prices[1].service_code, "wa");
    assert_eq!(prices[1].count, 0);
    assert_eq!(prices[2].country_id, 6);
}

#[tokio::test]
async fn bad_key_on_catalog_calls_is_an_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(HANDLER).query_param("action", "getCountries");
            then.status(200).body("BAD_KEY");
        })
        .await;

    let err = provider(&server).get_countries().await.unwrap_err();

    assert_eq!(err, Error::BadKey);
}

#[tokio::test]
async fn server_errors_are_not_parsed() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(HANDLER);
            then.status(502).body("Bad Gateway");
        })
        .await;

    let err = provider(&server).get_status("918273645").await.unwrap_err();

    assert_eq!(err, Error::InvalidHttpResponseStatusCode);
}
