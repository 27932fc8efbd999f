use super::types::{request, response};
use crate::{modules::number::repository, types::Context};
use std::sync::Arc;

pub async fn service(ctx: Arc<Context>, payload: request::Payload) -> response::Response {
    repository::find_many(
        &ctx.db_conn.pool,
        payload.pagination,
        repository::FindManyFilters {
            user_id: payload.auth.user.id.clone(),
            status: payload.filters.status,
        },
    )
    .await
    .map(response::Success::Activations)
    .map_err(|_| response::Error::FailedToFetchActivations)
}
