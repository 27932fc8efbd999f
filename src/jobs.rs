use crate::{
    modules::{auth, catalog, number, payment},
    types::{self, SchedulableJob},
};
use apalis::cron::CronStream;
use apalis::prelude::*;
use apalis::utils::TokioExecutor;
use std::sync::Arc;

fn list(ctx: Arc<types::Context>) -> Vec<SchedulableJob> {
    [
        auth::job::list(ctx.clone()),
        catalog::job::list(ctx.clone()),
        number::job::list(ctx.clone()),
        payment::job::list(ctx),
    ]
    .into_iter()
    .flatten()
    .collect()
}

pub fn monitor(ctx: Arc<types::Context>) -> Monitor<TokioExecutor> {
    let mut monitor = Monitor::<TokioExecutor>::new();

    for job in list(ctx) {
        tracing::debug!("Scheduling job {}", job.name);

        let run = job.job.clone();
        let worker = WorkerBuilder::new(format!("numhub::{}", job.name))
            .stream(CronStream::new(job.schedule).into_stream())
            .build_fn(move |_tick: types::Job| {
                let run = run.clone();
                async move { run().await }
            });
        monitor = monitor.register_with_count(1, worker);
    }

    monitor
}
