use super::types::{request, response};
use crate::{
    modules::{auth::service, user, wallet},
    types::Context,
};
use std::sync::Arc;
use validator::Validate;

pub async fn service(ctx: Arc<Context>, payload: request::Payload) -> response::Response {
    payload.validate().map_err(|errors| {
        tracing::warn!("Failed to validate payload: {errors}");
        response::Error::FailedToValidate(errors)
    })?;

    let email = payload.email.trim().to_lowercase();

    let password_hash =
        service::hash_password(&payload.password).map_err(|_| response::Error::SignupFailed)?;

    let mut tx = ctx.db_conn.pool.begin().await.map_err(|err| {
        tracing::error!("Failed to start database transaction: {}", err);
        response::Error::UnexpectedError
    })?;

    if user::repository::find_by_email(&mut *tx, email.clone())
        .await
        .map_err(|_| response::Error::FailedToFetchUser)?
        .is_some()
    {
        return Err(response::Error::EmailAlreadyInUse);
    }

    let user = user::repository::create(
        &mut *tx,
        user::repository::CreateUserPayload {
            email,
            password_hash,
            first_name: payload.first_name.trim().to_string(),
            last_name: payload.last_name.trim().to_string(),
        },
    )
    .await
    .map_err(|_| response::Error::SignupFailed)?;

    wallet::repository::create(&mut *tx, user.id.clone())
        .await
        .map_err(|_| response::Error::FailedToCreateWallet)?;

    tx.commit().await.map_err(|err| {
        tracing::error!("Failed to commit database transaction: {}", err);
        response::Error::UnexpectedError
    })?;

    tracing::info!("New account created for user {}", user.id);

    Ok(response::Success::AccountCreated)
}
