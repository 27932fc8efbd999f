use super::types::response;
use crate::{modules::catalog::service as catalog, types::Context};
use std::sync::Arc;

pub async fn service(ctx: Arc<Context>) -> response::Response {
    catalog::sync(ctx)
        .await
        .map(response::Success::Synced)
        .map_err(|err| match err {
            catalog::Error::ProviderUnavailable(_) => response::Error::ProviderUnavailable,
            catalog::Error::UnexpectedError => response::Error::FailedToSyncCatalog,
        })
}
