use super::service;
use crate::types::{Context, JobFn, SchedulableJob};
use std::str::FromStr;
use std::sync::Arc;

async fn catalog_sync_job(ctx: Arc<Context>) -> Result<(), apalis::prelude::Error> {
    tracing::debug!("Syncing catalog from SMS provider...");
    if let Err(err) = service::sync(ctx).await {
        tracing::warn!("Catalog sync failed: {:?}", err);
    }
    Ok(())
}

fn setup_catalog_sync_job(ctx: Arc<Context>) -> JobFn {
    Arc::new(move || {
        let ctx = ctx.clone();
        Box::pin(async move { catalog_sync_job(ctx).await })
    })
}

pub fn list(ctx: Arc<Context>) -> Vec<SchedulableJob> {
    vec![SchedulableJob {
        name: "catalog::sync",
        schedule: apalis::cron::Schedule::from_str("0 0 * * * *").expect("Couldn't create schedule"),
        job: setup_catalog_sync_job(ctx),
    }]
}
