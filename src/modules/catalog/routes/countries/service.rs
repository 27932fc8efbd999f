use super::types::response;
use crate::{modules::catalog::repository, types::Context};
use std::sync::Arc;

pub async fn service(ctx: Arc<Context>) -> response::Response {
    repository::find_many_countries(&ctx.db_conn.pool)
        .await
        .map(response::Success::Countries)
        .map_err(|_| response::Error::FailedToFetchCountries)
}
