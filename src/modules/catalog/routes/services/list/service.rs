use super::types::{request, response};
use crate::{modules::catalog::repository, types::Context};
use std::sync::Arc;

pub async fn service(ctx: Arc<Context>, filters: request::Filters) -> response::Response {
    repository::find_country_by_id(&ctx.db_conn.pool, filters.country)
        .await
        .map_err(|_| response::Error::FailedToFetchServices)?
        .ok_or(response::Error::CountryNotFound)?;

    repository::find_listings_by_country_id(&ctx.db_conn.pool, filters.country)
        .await
        .map(response::Success::Services)
        .map_err(|_| response::Error::FailedToFetchServices)
}
