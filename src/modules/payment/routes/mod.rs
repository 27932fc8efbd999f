mod deposit;
mod list;
mod verify;
mod webhook;

use crate::types::Context;
use axum::routing::{get, post, Router};
use std::sync::Arc;

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/", get(list::handler))
        .route("/deposit", post(deposit::handler))
        .route("/verify/:reference", get(verify::handler))
}

pub fn get_webhook_router() -> Router<Arc<Context>> {
    Router::new().nest("/monnify", webhook::get_router())
}
