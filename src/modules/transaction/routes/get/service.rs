use super::types::{request, response};
use crate::{
    modules::{transaction::repository, user},
    types::Context,
};
use std::sync::Arc;

/// Admins can read any ledger entry, everyone else only their own.
pub async fn service(ctx: Arc<Context>, payload: request::Payload) -> response::Response {
    let user = &payload.auth.user;

    let transaction = match user::repository::is_admin(user) {
        true => repository::find_by_id(&ctx.db_conn.pool, payload.id.clone()).await,
        false => {
            repository::find_by_id_and_user_id(
                &ctx.db_conn.pool,
                payload.id.clone(),
                user.id.clone(),
            )
            .await
        }
    }
    .map_err(|_| response::Error::FailedToFetchTransaction)?;

    match transaction {
        Some(transaction) => Ok(response::Success::Transaction(transaction)),
        None => {
            tracing::debug!("Transaction {} not visible to {}", payload.id, user.id);
            Err(response::Error::TransactionNotFound)
        }
    }
}
