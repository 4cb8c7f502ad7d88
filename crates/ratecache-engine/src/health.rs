//! Health aggregation (C8): a read-only snapshot of KV reachability, quota
//! state, and total hits. Never fails — any internal error degrades a
//! boolean rather than aborting the response.

use std::sync::Arc;

use ratecache_domain::storage_keys::HIT_COUNT_KEY;
use ratecache_infrastructure::{KvStore, QuotaAccountant};
use tracing::warn;

/// Snapshot returned by [`HealthReporter::report`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthReport {
    /// Whether every underlying check succeeded.
    pub healthy: bool,
    /// Whether the KV store responded to a liveness probe.
    pub kv_reachable: bool,
    /// Configured daily quota ceiling.
    pub quota: u64,
    /// Upstream calls made so far today.
    pub calls_used: u64,
    /// Calls remaining before the ceiling (may be negative once exceeded).
    pub calls_remaining: i64,
    /// Whether at least one more upstream call is permitted.
    pub has_quota_remaining: bool,
    /// Total successfully served requests.
    pub hit_count: u64,
}

/// Builds a [`HealthReport`] from the KV store and quota accountant.
pub struct HealthReporter {
    kv: Arc<dyn KvStore>,
    quota: Arc<QuotaAccountant>,
}

impl HealthReporter {
    /// Build a reporter over the shared KV store and quota accountant.
    pub fn new(kv: Arc<dyn KvStore>, quota: Arc<QuotaAccountant>) -> Self {
        Self { kv, quota }
    }

    /// Produce the current health snapshot. Never returns an error: any
    /// failed sub-check is reflected as a degraded field instead.
    pub async fn report(&self) -> HealthReport {
        let kv_reachable = self.kv.health_check().await.unwrap_or_else(|err| {
            warn!(error = %err, "kv health check failed");
            false
        });

        let calls_used = self.quota.count().await.unwrap_or_else(|err| {
            warn!(error = %err, "quota count read failed");
            0
        });

        let calls_remaining = self.quota.remaining().await.unwrap_or_else(|err| {
            warn!(error = %err, "quota remaining read failed");
            self.quota.daily_quota() as i64
        });

        let has_quota_remaining = calls_remaining > 0;

        let hit_count = match self.kv.get(HIT_COUNT_KEY).await {
            Ok(Some(raw)) => raw.parse().unwrap_or(0),
            Ok(None) => 0,
            Err(err) => {
                warn!(error = %err, "hit count read failed");
                0
            }
        };

        HealthReport {
            healthy: kv_reachable,
            kv_reachable,
            quota: self.quota.daily_quota(),
            calls_used,
            calls_remaining,
            has_quota_remaining,
            hit_count,
        }
    }
}
