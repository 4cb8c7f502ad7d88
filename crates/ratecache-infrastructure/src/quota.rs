//! The quota accountant (C4): enforces the daily ceiling on upstream calls
//! via a monotonic counter in the KV store.
//!
//! Rollover of the counter at the start of a new day is left to an external
//! operator process — this type never resets `Q` itself.

use std::sync::Arc;

use ratecache_domain::storage_keys::QUOTA_KEY;

use crate::error::Result;
use crate::kv::KvStore;

/// Tracks upstream calls made against a fixed daily ceiling. Cheap to
/// clone: it holds only a shared store handle and the ceiling value, so the
/// engine and the health reporter can each hold their own handle onto the
/// same underlying counter.
#[derive(Clone)]
pub struct QuotaAccountant {
    store: Arc<dyn KvStore>,
    daily_quota: u64,
}

impl QuotaAccountant {
    /// Build an accountant enforcing `daily_quota` upstream calls per day.
    pub fn new(store: Arc<dyn KvStore>, daily_quota: u64) -> Self {
        Self { store, daily_quota }
    }

    /// Unconditionally record one upstream call, returning the new count.
    pub async fn increment(&self) -> Result<i64> {
        self.store.incr(QUOTA_KEY).await
    }

    /// Current call count. A missing counter reads as 0.
    pub async fn count(&self) -> Result<u64> {
        Ok(self
            .store
            .get(QUOTA_KEY)
            .await?
            .and_then(|v| v.parse().ok())
            .unwrap_or(0))
    }

    /// Calls remaining before the daily ceiling is hit. May be negative if
    /// the ceiling has already been exceeded.
    pub async fn remaining(&self) -> Result<i64> {
        Ok(self.daily_quota as i64 - self.count().await? as i64)
    }

    /// Whether at least one more upstream call is permitted.
    pub async fn has_remaining(&self) -> Result<bool> {
        Ok(self.remaining().await? > 0)
    }

    /// The configured daily ceiling.
    pub fn daily_quota(&self) -> u64 {
        self.daily_quota
    }
}
