use super::service;
use crate::types::{Context, JobFn, SchedulableJob};
use std::str::FromStr;
use std::sync::Arc;

async fn activation_expiry_job(ctx: Arc<Context>) -> Result<(), apalis::prelude::Error> {
    match service::expire_overdue(ctx).await {
        Ok(0) => (),
        Ok(count) => tracing::info!("Expired {} activations", count),
        Err(err) => tracing::warn!("Failed to expire activations: {:?}", err),
    };
    Ok(())
}

fn setup_activation_expiry_job(ctx: Arc<Context>) -> JobFn {
    Arc::new(move || {
        let ctx = ctx.clone();
        Box::pin(async move { activation_expiry_job(ctx).await })
    })
}

pub fn list(ctx: Arc<Context>) -> Vec<SchedulableJob> {
    vec![SchedulableJob {
        name: "number::activation_expiry",
        schedule: apalis::cron::Schedule::from_str("0 * * * * *").expect("Couldn't create schedule"),
        job: setup_activation_expiry_job(ctx),
    }]
}
