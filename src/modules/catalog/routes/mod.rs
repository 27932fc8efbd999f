mod countries;
mod services;

use crate::types::Context;
use axum::routing::Router;
use std::sync::Arc;

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .nest("/countries", countries::get_router())
        .nest("/services", services::get_router())
}
