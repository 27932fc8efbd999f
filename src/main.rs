use numhub_backend_rs::{
    app::App,
    jobs,
    modules::catalog,
    types::{Config, Context, ToContext},
};
use std::sync::Arc;
use tracing_subscriber::prelude::*;

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    let ctx: Arc<Context> = Arc::new(Config::default().to_context().await);

    let initial_sync = tokio::spawn({
        let ctx = ctx.clone();
        async move {
            if let Err(err) = catalog::service::sync(ctx).await {
                tracing::warn!("Initial catalog sync failed: {:?}", err);
            }
        }
    });

    let http = async {
        if let Err(err) = App::new(ctx.clone()).serve().await {
            tracing::error!("HTTP server stopped: {}", err);
        }
    };
    let job_monitor = async {
        if let Err(err) = jobs::monitor(ctx.clone()).run().await {
            tracing::error!("Job monitor stopped: {}", err);
        }
    };

    let _ = tokio::join!(http, job_monitor, initial_sync);
}
