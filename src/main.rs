use std::sync::Arc;

use anyhow::Context;

use stowage::api;
use stowage::config::ServiceConfig;
use stowage::manager::{self, JobManager};
use stowage::solver::MethodExecutor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ServiceConfig::from_env();
    tracing::info!(
        capacity = config.thread_capacity(),
        port = config.port,
        "starting stowage"
    );

    let manager = JobManager::new(&config, Arc::new(MethodExecutor));
    let _stats = manager::spawn_stats_task(manager.clone(), config.stats_interval);

    let app = api::routes(manager);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .context("failed to bind service port")?;
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
