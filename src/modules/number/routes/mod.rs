mod cancel;
mod errors;
mod finish;
mod get;
mod list;
mod purchase;

use crate::types::Context;
use axum::routing::{self, Router};
use std::sync::Arc;

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/", routing::get(list::handler))
        .route("/purchase", routing::post(purchase::handler))
        .route("/:id", routing::get(get::handler))
        .route("/:id/cancel", routing::post(cancel::handler))
        .route("/:id/finish", routing::post(finish::handler))
}
