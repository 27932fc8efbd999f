use super::types::{request, response};
use crate::{modules::auth::repository, types::Context};
use std::sync::Arc;

pub async fn service(ctx: Arc<Context>, auth: request::Auth) -> response::Response {
    repository::delete_by_id(&ctx.db_conn.pool, auth.session_id)
        .await
        .map_err(|_| response::Error::FailedToSignOut)
        .map(|_| response::Success::SignedOut)
}
