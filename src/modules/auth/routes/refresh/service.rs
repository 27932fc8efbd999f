use super::types::{request, response};
use crate::{modules::auth::service, types::Context};
use std::sync::Arc;

pub async fn service(ctx: Arc<Context>, payload: request::Payload) -> response::Response {
    service::regenerate_tokens_for_session(&ctx.db_conn.pool, &ctx.auth, payload.token)
        .await
        .map_err(|err| match err {
            service::Error::UnexpectedError => response::Error::FailedToRefreshTokens,
            _ => response::Error::InvalidRefreshToken,
        })
        .map(response::Success::Tokens)
}
