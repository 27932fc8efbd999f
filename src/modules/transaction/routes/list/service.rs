use super::types::{request, response};
use crate::{
    modules::{transaction::repository, user},
    types::Context,
};
use std::sync::Arc;

pub async fn service(ctx: Arc<Context>, payload: request::Payload) -> response::Response {
    let user_id = match user::repository::is_admin(&payload.auth.user) {
        true => payload.filters.user_id,
        false => Some(payload.auth.user.id.clone()),
    };

    repository::find_many(
        &ctx.db_conn.pool,
        payload.pagination,
        repository::FindManyFilters {
            user_id,
            before: payload.filters.before,
            after: payload.filters.after,
        },
    )
    .await
    .map(response::Success::Transactions)
    .map_err(|_| response::Error::FailedToFetchTransactions)
}
