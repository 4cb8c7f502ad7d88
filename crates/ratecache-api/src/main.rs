//! Rate cache API server binary.
//!
//! Serves `GET /pricing` and `GET /healthz` over HTTP. Configuration is
//! read entirely from the environment (spec §6); a missing required
//! variable aborts start-up with a non-zero exit code.

use anyhow::Context;
use ratecache_api::{create_app, ApiConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::from_env().context("failed to load configuration")?;
    ratecache_common::init_tracing(&config.core.log_level, config.core.log_json)?;

    info!(bind_address = %config.bind_address(), "starting rate cache API server");

    let app = create_app(&config).await.context("failed to build application")?;

    let listener = tokio::net::TcpListener::bind(&config.bind_address())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address()))?;

    info!(bind_address = %config.bind_address(), "rate cache API server ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("rate cache API server shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        return;
    }
    info!("received shutdown signal");
}
