mod list;
mod sync;

use crate::types::Context;
use axum::routing::{get, post, Router};
use std::sync::Arc;

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/", get(list::handler))
        .route("/sync", post(sync::handler))
}
