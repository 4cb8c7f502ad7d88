//! The revalidator loop (C6): a single long-lived task per process that
//! drives [`ratecache_engine::RateCacheEngine::refresh_all`] on a fixed
//! cadence until told to shut down.
//!
//! Running one revalidator per replica is supported but not recommended —
//! spec §4.6 notes the quota arithmetic assumes a single logical
//! revalidator per deployment; electing that single worker (leader
//! election, a dedicated pod, or equivalent) is left to the deployment
//! layer, not this crate.

#![warn(missing_docs)]

use std::sync::Arc;
use std::time::Duration;

use ratecache_engine::RateCacheEngine;
use tokio::sync::watch;
use tracing::info;

/// Run the fixed-cadence refresh loop until `shutdown` fires.
///
/// Each cycle calls `refresh_all()` once, logs its tally, then sleeps for
/// `interval` — unless `shutdown` fires first, in which case the sleep is
/// cut short and the loop exits without starting another cycle. A failing
/// cycle (logged inside the engine itself) never terminates the loop.
pub async fn run(engine: Arc<RateCacheEngine>, interval: Duration, mut shutdown: watch::Receiver<()>) {
    loop {
        let tally = engine.refresh_all().await;
        info!(updated = tally.updated, errors = tally.errors, "revalidation cycle complete");

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.changed() => {
                info!("revalidator received shutdown signal");
                break;
            }
        }
    }
}
