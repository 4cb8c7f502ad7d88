//! The rate cache engine (C5): the request-path SWR logic, key registry
//! maintenance, and batch revalidation.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use ratecache_domain::storage_keys::{cache_key, lock_key, REGISTRY_KEY};
use ratecache_domain::{Rate, RateKey, RateRequest};
use ratecache_infrastructure::{DistributedLock, KvStore, QuotaAccountant, UpstreamClient};

use crate::error::EngineError;

/// Tally returned by [`RateCacheEngine::refresh_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefreshTally {
    /// Number of registry entries successfully refreshed.
    pub updated: usize,
    /// Number of registry entries that could not be refreshed this pass
    /// (malformed key, or the upstream had nothing for that tuple).
    pub errors: usize,
}

/// A cache entry's on-wire encoding: `null` when the upstream has no rate
/// for a tuple, so "cached absence" is distinguishable from "never cached".
#[derive(Serialize, Deserialize)]
struct CachedEntry(Option<Rate>);

fn encode_cached(rate: &Option<Rate>) -> String {
    // `CachedEntry` only ever holds primitive, always-serializable data.
    serde_json::to_string(&CachedEntry(rate.clone())).expect("cached entry is always serializable")
}

fn decode_cached(raw: &str) -> Option<Rate> {
    serde_json::from_str::<CachedEntry>(raw).ok().and_then(|e| e.0)
}

/// The heart of the cache: serves reads with stale-while-revalidate
/// semantics and drives the periodic batch refresh the revalidator loop
/// calls into.
pub struct RateCacheEngine {
    kv: Arc<dyn KvStore>,
    lock: DistributedLock,
    upstream: Arc<dyn UpstreamClient>,
    quota: QuotaAccountant,
    cache_ttl: Duration,
}

impl RateCacheEngine {
    /// Build the engine from its already-constructed dependencies.
    pub fn new(
        kv: Arc<dyn KvStore>,
        lock: DistributedLock,
        upstream: Arc<dyn UpstreamClient>,
        quota: QuotaAccountant,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            kv,
            lock,
            upstream,
            quota,
            cache_ttl,
        }
    }

    /// `Some(inner)` is a cache hit — `inner` may itself be `None` for a
    /// tuple whose absence was cached (§9 open question 1). `None` means no
    /// entry exists yet, i.e. a true miss.
    async fn fast_read(&self, key: &RateKey) -> Option<Option<Rate>> {
        match self.kv.get(&cache_key(key)).await {
            Ok(Some(raw)) => Some(decode_cached(&raw)),
            Ok(None) => None,
            Err(err) => {
                // Transport failure on a read is treated as a miss so the
                // request path degrades instead of failing outright.
                warn!(%key, error = %err, "fast-path read failed, treating as miss");
                None
            }
        }
    }

    /// Serve a rate for `request`, coalescing concurrent misses through the
    /// distributed lock. `Ok(None)` is a successful response: the upstream
    /// has no rate for this (valid) tuple right now.
    pub async fn get_rate(&self, request: RateRequest) -> Result<Option<Rate>, EngineError> {
        let key = RateKey::new(request);

        if let Some(cached) = self.fast_read(&key).await {
            debug!(%key, "cache hit on fast path");
            return Ok(cached);
        }

        match self.quota.has_remaining().await {
            Ok(false) => return Err(EngineError::NoQuota),
            Ok(true) => {}
            Err(err) => warn!(error = %err, "quota pre-check failed, proceeding optimistically"),
        }

        let outcome = self
            .lock
            .with_lock(&lock_key(&key), || async {
                // Double-check: another replica may have filled the entry
                // while we waited for the lock.
                if let Some(cached) = self.fast_read(&key).await {
                    debug!(%key, "cache hit after lock acquisition (coalesced)");
                    return cached;
                }

                let rate = self.upstream.fetch_single(request).await;

                if rate.is_some() {
                    if let Err(err) = self.quota.increment().await {
                        warn!(%key, error = %err, "failed to record quota increment");
                    }
                }

                if let Err(err) = self
                    .kv
                    .set_with_ttl(&cache_key(&key), &encode_cached(&rate), self.cache_ttl)
                    .await
                {
                    warn!(%key, error = %err, "failed to write cache entry");
                }

                if let Err(err) = self.kv.sadd(REGISTRY_KEY, key.as_str()).await {
                    warn!(%key, error = %err, "failed to enroll key in registry");
                }

                rate
            })
            .await;

        outcome.ok_or(EngineError::LockUnavailable)
    }

    /// Batch-refresh every key in the registry. Called by the revalidator
    /// loop on a fixed cadence.
    pub async fn refresh_all(&self) -> RefreshTally {
        let raw_keys = match self.kv.smembers(REGISTRY_KEY).await {
            Ok(keys) => keys,
            Err(err) => {
                warn!(error = %err, "failed to read registry for refresh");
                return RefreshTally::default();
            }
        };

        if raw_keys.is_empty() {
            return RefreshTally::default();
        }

        let mut keys = Vec::with_capacity(raw_keys.len());
        let mut malformed = 0usize;
        for raw in &raw_keys {
            match raw.parse::<RateKey>() {
                Ok(key) => keys.push(key),
                Err(err) => {
                    warn!(raw = %raw, error = %err, "skipping malformed registry entry");
                    malformed += 1;
                }
            }
        }

        if keys.is_empty() {
            return RefreshTally {
                updated: 0,
                errors: malformed,
            };
        }

        let requests: Vec<RateRequest> = keys
            .iter()
            .map(|k| k.decode().expect("already validated above"))
            .collect();

        let rates = self.upstream.fetch_batch(&requests).await;
        if rates.is_empty() {
            return RefreshTally {
                updated: 0,
                errors: malformed + requests.len(),
            };
        }

        if let Err(err) = self.quota.increment().await {
            warn!(error = %err, "failed to record quota increment for batch");
        }

        let mut updated = 0usize;
        let mut errors = malformed;

        for (key, request) in keys.iter().zip(requests.iter()) {
            match rates.get(request) {
                Some(rate) => {
                    if let Err(err) = self
                        .kv
                        .set_with_ttl(&cache_key(key), &encode_cached(&Some(rate.clone())), self.cache_ttl)
                        .await
                    {
                        warn!(%key, error = %err, "failed to write refreshed entry");
                    }
                    updated += 1;
                }
                None => {
                    debug!(%key, "upstream had no rate for this key during refresh");
                    errors += 1;
                }
            }
        }

        RefreshTally { updated, errors }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ratecache_domain::{Hotel, Period, Room};
    use ratecache_infrastructure::upstream::RateMap;
    use ratecache_infrastructure::InMemoryKvStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingUpstream {
        calls: AtomicUsize,
        rate: Option<Rate>,
    }

    #[async_trait]
    impl UpstreamClient for CountingUpstream {
        async fn fetch_batch(&self, requests: &[RateRequest]) -> RateMap {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut map = RateMap::new();
            if let Some(rate) = &self.rate {
                for request in requests {
                    map.insert(*request, rate.clone());
                }
            }
            map
        }
    }

    fn sample() -> RateRequest {
        RateRequest::new(Period::Summer, Hotel::FloatingPointResort, Room::SingletonRoom)
    }

    fn build_engine(upstream: Arc<CountingUpstream>) -> RateCacheEngine {
        let kv: Arc<dyn KvStore> = Arc::new(InMemoryKvStore::new());
        let lock = DistributedLock::new(kv.clone(), Duration::from_secs(5), 2, Duration::from_millis(10));
        let quota = QuotaAccountant::new(kv.clone(), 1000);
        RateCacheEngine::new(kv, lock, upstream, quota, Duration::from_secs(300))
    }

    #[tokio::test]
    async fn cold_miss_then_hit_calls_upstream_once() {
        let upstream = Arc::new(CountingUpstream {
            calls: AtomicUsize::new(0),
            rate: Some(Rate::new("12000")),
        });
        let engine = build_engine(upstream.clone());

        let first = engine.get_rate(sample()).await.unwrap();
        assert_eq!(first, Some(Rate::new("12000")));

        let second = engine.get_rate(sample()).await.unwrap();
        assert_eq!(second, Some(Rate::new("12000")));

        assert_eq!(upstream.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn quota_exhaustion_yields_service_unavailable() {
        let upstream = Arc::new(CountingUpstream {
            calls: AtomicUsize::new(0),
            rate: Some(Rate::new("12000")),
        });
        let kv: Arc<dyn KvStore> = Arc::new(InMemoryKvStore::new());
        let lock = DistributedLock::new(kv.clone(), Duration::from_secs(5), 2, Duration::from_millis(10));
        let quota = QuotaAccountant::new(kv.clone(), 0);
        let engine = RateCacheEngine::new(kv, lock, upstream.clone(), quota, Duration::from_secs(300));

        let err = engine.get_rate(sample()).await.unwrap_err();
        assert_eq!(err, EngineError::NoQuota);
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_tuple_caches_empty_result() {
        let upstream = Arc::new(CountingUpstream {
            calls: AtomicUsize::new(0),
            rate: None,
        });
        let engine = build_engine(upstream.clone());

        let first = engine.get_rate(sample()).await.unwrap();
        assert_eq!(first, None);

        let second = engine.get_rate(sample()).await.unwrap();
        assert_eq!(second, None);

        // The second call was served from the cached ∅, not a second
        // upstream round trip.
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn refresh_all_on_empty_registry_makes_no_upstream_call() {
        let upstream = Arc::new(CountingUpstream {
            calls: AtomicUsize::new(0),
            rate: Some(Rate::new("1")),
        });
        let engine = build_engine(upstream.clone());

        let tally = engine.refresh_all().await;
        assert_eq!(tally, RefreshTally { updated: 0, errors: 0 });
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn refresh_all_updates_every_registered_key_in_one_call() {
        let upstream = Arc::new(CountingUpstream {
            calls: AtomicUsize::new(0),
            rate: Some(Rate::new("500")),
        });
        let engine = build_engine(upstream.clone());

        // Populate the registry via three cold misses.
        engine
            .get_rate(RateRequest::new(Period::Summer, Hotel::FloatingPointResort, Room::SingletonRoom))
            .await
            .unwrap();
        engine
            .get_rate(RateRequest::new(Period::Winter, Hotel::FloatingPointResort, Room::SingletonRoom))
            .await
            .unwrap();
        engine
            .get_rate(RateRequest::new(Period::Autumn, Hotel::FloatingPointResort, Room::SingletonRoom))
            .await
            .unwrap();
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 3);

        let tally = engine.refresh_all().await;
        assert_eq!(tally, RefreshTally { updated: 3, errors: 0 });
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 4);
    }
}
