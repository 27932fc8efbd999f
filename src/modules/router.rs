use axum::{http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;

use super::{auth, catalog, number, payment, transaction, user, wallet};
use crate::types::Context;
use std::sync::Arc;

async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({ "message": "Welcome to Numhub API" })),
    )
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/", get(health_check))
        .nest("/auth", auth::get_router())
        .nest("/users", user::get_router())
        .nest("/wallets", wallet::get_router())
        .nest("/transactions", transaction::get_router())
        .merge(catalog::get_router())
        .nest("/numbers", number::get_router())
        .nest("/payments", payment::get_router())
        .nest("/webhooks", payment::get_webhook_router())
}
