use super::service;
use crate::types::{Context, JobFn, SchedulableJob};
use std::str::FromStr;
use std::sync::Arc;

async fn deposit_reconciliation_job(ctx: Arc<Context>) -> Result<(), apalis::prelude::Error> {
    tracing::debug!("Reconciling pending deposits...");
    match service::reconcile_pending(ctx).await {
        Ok(0) => (),
        Ok(count) => tracing::info!("Reconciled {} pending deposits", count),
        Err(err) => tracing::warn!("Failed to reconcile pending deposits: {:?}", err),
    };
    Ok(())
}

fn setup_deposit_reconciliation_job(ctx: Arc<Context>) -> JobFn {
    Arc::new(move || {
        let ctx = ctx.clone();
        Box::pin(async move { deposit_reconciliation_job(ctx).await })
    })
}

pub fn list(ctx: Arc<Context>) -> Vec<SchedulableJob> {
    vec![SchedulableJob {
        name: "payment::deposit_reconciliation",
        schedule: apalis::cron::Schedule::from_str("0 */5 * * * *")
            .expect("Couldn't create schedule"),
        job: setup_deposit_reconciliation_job(ctx),
    }]
}
