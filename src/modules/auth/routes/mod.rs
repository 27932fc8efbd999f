mod login;
mod logout;
mod refresh;
mod sign_up;

use crate::types::Context;
use axum::routing::Router;
use std::sync::Arc;

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .nest("/sign-up", sign_up::get_router())
        .nest("/login", login::get_router())
        .nest("/refresh", refresh::get_router())
        .nest("/logout", logout::get_router())
}
