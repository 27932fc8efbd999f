use super::repository;
use crate::types::{Context, JobFn, SchedulableJob};
use chrono::Utc;
use std::str::FromStr;
use std::sync::Arc;

async fn session_cleanup_job(ctx: Arc<Context>) -> Result<(), apalis::prelude::Error> {
    match repository::delete_expired(&ctx.db_conn.pool, Utc::now().naive_utc()).await {
        Ok(count) => tracing::debug!("Removed {} expired sessions", count),
        Err(_) => tracing::warn!("Failed to remove expired sessions"),
    };
    Ok(())
}

fn setup_session_cleanup_job(ctx: Arc<Context>) -> JobFn {
    Arc::new(move || {
        let ctx = ctx.clone();
        Box::pin(async move { session_cleanup_job(ctx).await })
    })
}

pub fn list(ctx: Arc<Context>) -> Vec<SchedulableJob> {
    vec![SchedulableJob {
        name: "auth::session_cleanup",
        schedule: apalis::cron::Schedule::from_str("@daily").expect("Couldn't create schedule"),
        job: setup_session_cleanup_job(ctx),
    }]
}
