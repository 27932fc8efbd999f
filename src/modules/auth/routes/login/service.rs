use super::types::{request, response};
use crate::{
    modules::{auth::service, user},
    types::Context,
};
use std::sync::Arc;

pub async fn service(ctx: Arc<Context>, payload: request::Payload) -> response::Response {
    let user = user::repository::find_by_email(
        &ctx.db_conn.pool,
        payload.email.trim().to_lowercase(),
    )
    .await
    .map_err(|_| response::Error::FailedToFetchUser)?
    .ok_or(response::Error::InvalidCredentials)?;

    service::verify_password(&payload.password, &user.password_hash).map_err(|_| {
        tracing::debug!("Password mismatch for user {}", user.id);
        response::Error::InvalidCredentials
    })?;

    let session = service::create_session(&ctx.db_conn.pool, &ctx.auth, user.id.clone())
        .await
        .map_err(|_| response::Error::FailedToCreateSession)?;

    Ok(response::Success::SignedIn(session, user))
}
