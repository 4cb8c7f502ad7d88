//! Revalidator binary: the long-lived process that drives the fixed-cadence
//! batch refresh described in spec §4.6.
//!
//! Deployers SHOULD run exactly one instance of this binary per deployment
//! (spec §4.6, §9 "Leader-only revalidator") — this binary does not itself
//! perform leader election.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use ratecache_common::CoreConfig;
use ratecache_infrastructure::{DistributedLock, HttpUpstreamClient, KvStore, QuotaAccountant, RedisKvStore};
use ratecache_revalidator::run;
use tokio::sync::watch;
use tracing::{error, info};

/// Command-line overrides for the environment-backed configuration.
#[derive(Parser, Debug)]
#[command(name = "revalidator", author, version, about, long_about = None)]
struct Args {
    /// Override the revalidation interval (T_r), in milliseconds.
    #[arg(long, env = "REVALIDATE_INTERVAL_MS")]
    revalidate_interval_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = CoreConfig::from_env().context("failed to load configuration")?;
    if let Some(interval) = args.revalidate_interval_ms {
        config.revalidate_interval_ms = interval;
    }

    ratecache_common::init_tracing(&config.log_level, config.log_json)?;
    info!(interval_ms = config.revalidate_interval_ms, "starting revalidator");

    let kv: Arc<dyn KvStore> = Arc::new(
        RedisKvStore::connect(&config.redis_url)
            .await
            .context("failed to connect to redis")?,
    );
    let upstream = Arc::new(
        HttpUpstreamClient::new(
            config.upstream_url.clone(),
            config.upstream_token.clone(),
            config.upstream_timeout(),
        )
        .context("failed to build upstream client")?,
    );
    let lock = DistributedLock::new(
        kv.clone(),
        config.lock_ttl(),
        config.lock_retry_count,
        config.lock_retry_delay(),
    );
    let quota = QuotaAccountant::new(kv.clone(), config.upstream_quota);
    let engine = Arc::new(ratecache_engine::RateCacheEngine::new(
        kv,
        lock,
        upstream,
        quota,
        config.cache_ttl(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(());
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for shutdown signal");
            return;
        }
        info!("received shutdown signal");
        let _ = shutdown_tx.send(());
    });

    run(engine, Duration::from_millis(config.revalidate_interval_ms), shutdown_rx).await;

    info!("revalidator shut down cleanly");
    Ok(())
}
