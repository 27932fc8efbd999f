use super::types::{request, response};
use crate::{modules::wallet::repository, types::Context};
use std::sync::Arc;

pub async fn service(ctx: Arc<Context>, payload: request::Payload) -> response::Response {
    repository::find_by_owner_id(&ctx.db_conn.pool, payload.auth.user.id)
        .await
        .map_err(|_| response::Error::FailedToFetchWallet)?
        .ok_or(response::Error::WalletNotFound)
        .map(response::Success::Wallet)
}
