use httpmock::prelude::*;
use numhub_backend_rs::client::{ApiClient, Error, TokenPair};
use serde_json::{json, Value};
use std::time::Duration;

fn user() -> Value {
    json!({
        "id": "01J2Z6Q3M8V0Y7R5T4W1X9K2AB",
        "email": "ada@example.com",
        "first_name": "Ada",
        "last_name": "Obi",
        "role": "USER",
        "created_at": "2024-06-01T10:00:00",
        "updated_at": null
    })
}

fn wallet() -> Value {
    json!({
        "id": "01J2Z6Q3M8V0Y7R5T4W1X9K2AC",
        "balance": "1500",
        "owner_id": "01J2Z6Q3M8V0Y7R5T4W1X9K2AB",
        "created_at": "2024-06-01T10:00:00",
        "updated_at": null
    })
}

fn refreshed() -> Value {
    json!({
        "access_token": "access-2",
        "refresh_token": "refresh-2",
        "access_token_expires_at": "2024-06-01T10:15:00"
    })
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
async fn login_stores_the_token_pair() {
    let server = MockServer::start_async().await;
    let login = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/auth/login")
                .json_body(json!({ "email": "ada@example.com", "password": "hunter22" }));
            then.status(200).json_body(json!({
                "access_token": "access-1",
                "refresh_token": "refresh-1",
                "access_token_expires_at": "2024-06-01T10:15:00",
                "user": user()
            }));
        })
        .await;

    let client = ApiClient::new(server.url("/api"));
    let response = client.login("ada@example.com", "hunter22").await.unwrap();

    login.assert_async().await;
    assert_eq!(response.user.email, "ada@example.com");
    assert_eq!(
        client.tokens().await,
        Some(TokenPair {
            access_token: "access-1".to_string(),
            refresh_token: "refresh-1".to_string(),
        })
    );
}

#[tokio::test]
async fn expired_access_token_is_refreshed_and_request_replayed() {
    let server = MockServer::start_async().await;
    let stale = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/users/profile")
                .header("authorization", "Bearer access-1");
            then.status(401).json_body(json!({ "error": "Expired access token" }));
        })
        .await;
    let fresh = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/users/profile")
                .header("authorization", "Bearer access-2");
            then.status(200).json_body(user());
        })
        .await;
    let refresh = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/auth/refresh")
                .json_body(json!({ "token": "refresh-1" }));
            then.status(200).json_body(refreshed());
        })
        .await;

    let client = signed_in_client(&server).await;
    let profile = client.profile().await.unwrap();

    assert_eq!(profile.first_name, "Ada");
    stale.assert_hits_async(1).await;
    fresh.assert_hits_async(1).await;
    refresh.assert_hits_async(1).await;
    assert_eq!(
        client.tokens().await.map(|tokens| tokens.refresh_token),
        Some("refresh-2".to_string())
    );
}

#[tokio::test]
async fn concurrent_unauthorized_requests_share_one_refresh() {
    let server = MockServer::start_async().await;
    let stale = server
        .mock_async(|when, then| {
            when.header("authorization", "Bearer access-1");
            then.status(401).json_body(json!({ "error": "Expired access token" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/users/profile")
                .header("authorization", "Bearer access-2");
            then.status(200).json_body(user());
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/wallets/profile")
                .header("authorization", "Bearer access-2");
            then.status(200).json_body(wallet());
        })
        .await;
    let refresh = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/auth/refresh");
            then.status(200)
                .delay(Duration::from_millis(300))
                .json_body(refreshed());
        })
        .await;

    let client = signed_in_client(&server).await;
    let (profile, wallet) = tokio::join!(client.profile(), client.wallet());

    assert!(profile.is_ok());
    assert_eq!(wallet.unwrap().balance.to_string(), "1500");
    stale.assert_hits_async(2).await;
    refresh.assert_hits_async(1).await;
}

#[tokio::test]
async fn late_unauthorized_replays_with_the_already_refreshed_token() {
    let server = MockServer::start_async().await;
    let stale_profile = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/users/profile")
                .header("authorization", "Bearer access-1");
            then.status(401)
                .delay(Duration::from_millis(300))
                .json_body(json!({ "error": "Expired access token" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/wallets/profile")
                .header("authorization", "Bearer access-1");
            then.status(401).json_body(json!({ "error": "Expired access token" }));
        })
        .await;
    let fresh_profile = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/users/profile")
                .header("authorization", "Bearer access-2");
            then.status(200).json_body(user());
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/wallets/profile")
                .header("authorization", "Bearer access-2");
            then.status(200).json_body(wallet());
        })
        .await;
    let refresh = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/auth/refresh");
            then.status(200).json_body(refreshed());
        })
        .await;

    let client = signed_in_client(&server).await;
    let (profile, wallet) = tokio::join!(client.profile(), client.wallet());

    assert_eq!(profile.unwrap().first_name, "Ada");
    assert!(wallet.is_ok());
    stale_profile.assert_hits_async(1).await;
    fresh_profile.assert_hits_async(1).await;
    refresh.assert_hits_async(1).await;
}

#[tokio::test]
async fn logout_during_refresh_is_not_undone() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/users/profile")
                .header("authorization", "Bearer access-1");
            then.status(401).json_body(json!({ "error": "Expired access token" }));
        })
        .await;
    let fresh_profile = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/users/profile")
                .header("authorization", "Bearer access-2");
            then.status(200).json_body(user());
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/auth/refresh");
            then.status(200)
                .delay(Duration::from_millis(400))
                .json_body(refreshed());
        })
        .await;
    let logout = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/auth/logout");
            then.status(200).json_body(json!({ "message": "Logged out" }));
        })
        .await;

    let client = signed_in_client(&server).await;
    let profile = tokio::spawn({
        let client = client.clone();
        async move { client.profile().await }
    });

    tokio::time::sleep(Duration::from_millis(150)).await;
    client.logout().await.unwrap();

    assert_eq!(profile.await.unwrap().unwrap_err(), Error::SessionExpired);
    assert_eq!(client.tokens().await, None);
    logout.assert_hits_async(1).await;
    fresh_profile.assert_hits_async(0).await;
}

#[tokio::test]
async fn login_during_refresh_is_kept_and_used_for_the_replay() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/users/profile")
                .header("authorization", "Bearer access-1");
            then.status(401).json_body(json!({ "error": "Expired access token" }));
        })
        .await;
    let relogged_profile = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/users/profile")
                .header("authorization", "Bearer access-9");
            then.status(200).json_body(user());
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/auth/refresh");
            then.status(401)
                .delay(Duration::from_millis(400))
                .json_body(json!({ "error": "Invalid refresh token" }));
        })
        .await;

    let client = signed_in_client(&server).await;
    let profile = tokio::spawn({
        let client = client.clone();
        async move { client.profile().await }
    });

    tokio::time::sleep(Duration::from_millis(150)).await;
    client
        .set_tokens(TokenPair {
            access_token: "access-9".to_string(),
            refresh_token: "refresh-9".to_string(),
        })
        .await;

    assert_eq!(profile.await.unwrap().unwrap().first_name, "Ada");
    relogged_profile.assert_hits_async(1).await;
    assert_eq!(
        client.tokens().await.map(|tokens| tokens.access_token),
        Some("access-9".to_string())
    );
}

#[tokio::test]
async fn expired_logout_is_refreshed_before_it_is_sent_again() {
    let server = MockServer::start_async().await;
    let stale_logout = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/auth/logout")
                .header("authorization", "Bearer access-1");
            then.status(401).json_body(json!({ "error": "Expired access token" }));
        })
        .await;
    let fresh_logout = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/auth/logout")
                .header("authorization", "Bearer access-2");
            then.status(200).json_body(json!({ "message": "Logged out" }));
        })
        .await;
    let refresh = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/auth/refresh")
                .json_body(json!({ "token": "refresh-1" }));
            then.status(200).json_body(refreshed());
        })
        .await;

    let client = signed_in_client(&server).await;
    client.logout().await.unwrap();

    stale_logout.assert_hits_async(1).await;
    refresh.assert_hits_async(1).await;
    fresh_logout.assert_hits_async(1).await;
    assert_eq!(client.tokens().await, None);
}

#[tokio::test]
async fn auth_endpoints_are_not_retried() {
    let server = MockServer::start_async().await;
    let login = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/auth/login");
            then.status(401).json_body(json!({ "error": "Invalid credentials" }));
        })
        .await;
    let refresh = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/auth/refresh");
            then.status(200).json_body(refreshed());
        })
        .await;

    let client = ApiClient::new(server.url("/api"));
    let err = client.login("ada@example.com", "wrong").await.unwrap_err();

    assert_eq!(err, Error::Unauthorized("Invalid credentials".to_string()));
    login.assert_hits_async(1).await;
    refresh.assert_hits_async(0).await;
    assert_eq!(client.tokens().await, None);
}

#[tokio::test]
async fn failed_refresh_expires_the_session() {
    let server = MockServer::start_async().await;
    let profile = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/users/profile");
            then.status(401).json_body(json!({ "error": "Expired access token" }));
        })
        .await;
    let refresh = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/auth/refresh");
            then.status(401).json_body(json!({ "error": "Invalid refresh token" }));
        })
        .await;

    let client = signed_in_client(&server).await;
    let err = client.profile().await.unwrap_err();

    assert_eq!(err, Error::SessionExpired);
    profile.assert_hits_async(1).await;
    refresh.assert_hits_async(1).await;
    assert_eq!(client.tokens().await, None);
}

#[tokio::test]
async fn second_unauthorized_after_refresh_expires_the_session() {
    let server = MockServer::start_async().await;
    let profile = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/users/profile");
            then.status(401).json_body(json!({ "error": "Expired access token" }));
        })
        .await;
    let refresh = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/auth/refresh");
            then.status(200).json_body(refreshed());
        })
        .await;

    let client = signed_in_client(&server).await;
    let err = client.profile().await.unwrap_err();

    assert_eq!(err, Error::SessionExpired);
    profile.assert_hits_async(2).await;
    refresh.assert_hits_async(1).await;
    assert_eq!(client.tokens().await, None);
}

#[tokio::test]
async fn forbidden_is_not_retried() {
    let server = MockServer::start_async().await;
    let transaction = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/transactions/01J2Z6Q3M8V0Y7R5T4W1X9K2AD");
            then.status(403).json_body(json!({ "error": "Forbidden" }));
        })
        .await;
    let refresh = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/auth/refresh");
            then.status(200).json_body(refreshed());
        })
        .await;

    let client = signed_in_client(&server).await;
    let err = client
        .transaction("01J2Z6Q3M8V0Y7R5T4W1X9K2AD")
        .await
        .unwrap_err();

    assert_eq!(err, Error::Forbidden("Forbidden".to_string()));
    assert!(err.is_session_error());
    transaction.assert_hits_async(1).await;
    refresh.assert_hits_async(0).await;
}

#[tokio::test]
async fn rate_limit_starts_a_cooldown() {
    let server = MockServer::start_async().await;
    let countries = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/countries");
            then.status(429)
                .header("Retry-After", "60")
                .json_body(json!({ "error": "Too many requests" }));
        })
        .await;
    let wallet_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/wallets/profile");
            then.status(200).json_body(wallet());
        })
        .await;

    let client = signed_in_client(&server).await;

    let err = client.countries().await.unwrap_err();
    assert_eq!(
        err,
        Error::RateLimited {
            retry_after: Duration::from_secs(60)
        }
    );

    match client.wallet().await.unwrap_err() {
        Error::RateLimited { retry_after } => assert!(retry_after <= Duration::from_secs(60)),
        err => panic!("Expected a rate limit error, got {:?}", err),
    }

    countries.assert_hits_async(1).await;
    wallet_mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn client_errors_carry_the_server_message() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/numbers/purchase")
                .json_body(json!({ "country": 0, "service": "tg" }));
            then.status(400).json_body(json!({ "error": "Insufficient balance" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/numbers/01J2Z6Q3M8V0Y7R5T4W1X9K2AE");
            then.status(503).json_body(json!({ "error": "Number provider unavailable" }));
        })
        .await;

    let client = signed_in_client(&server).await;

    assert_eq!(
        client.purchase_number(0, "tg").await.unwrap_err(),
        Error::Validation {
            status: 400,
            message: "Insufficient balance".to_string()
        }
    );
    assert_eq!(
        client.number("01J2Z6Q3M8V0Y7R5T4W1X9K2AE").await.unwrap_err(),
        Error::Server {
            status: 503,
            message: "Number provider unavailable".to_string()
        }
    );
}

#[tokio::test]
async fn authenticated_calls_without_tokens_fail_locally() {
    let server = MockServer::start_async().await;
    let profile = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/users/profile");
            then.status(200).json_body(user());
        })
        .await;

    let client = ApiClient::new(server.url("/api"));

    assert_eq!(client.profile().await.unwrap_err(), Error::SessionExpired);
    profile.assert_hits_async(0).await;
}

#[tokio::test]
async fn logout_clears_tokens_even_when_the_server_fails() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/auth/logout");
            then.status(500).json_body(json!({ "error": "Failed to log out" }));
        })
        .await;

    let client = signed_in_client(&server).await;

    assert!(client.logout().await.is_err());
    assert_eq!(client.tokens().await, None);
}
