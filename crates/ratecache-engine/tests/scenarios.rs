//! End-to-end scenario tests against the in-memory fakes, covering spec.md
//! §8 S4-S6 (the revalidator batch, concurrent-miss coalescing, and the
//! empty-registry no-op) against a live [`RateCacheEngine`] rather than a
//! single method in isolation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use ratecache_domain::{Hotel, Period, Rate, RateRequest, Room};
use ratecache_engine::{RateCacheEngine, RefreshTally};
use ratecache_infrastructure::upstream::RateMap;
use ratecache_infrastructure::{DistributedLock, InMemoryKvStore, KvStore, QuotaAccountant, UpstreamClient};

/// Upstream stub that counts batch calls and optionally sleeps before
/// answering, to stand in for real wire latency in the coalescing scenario.
struct LatentUpstream {
    calls: AtomicUsize,
    latency: Duration,
    rate: Rate,
}

#[async_trait]
impl UpstreamClient for LatentUpstream {
    async fn fetch_batch(&self, requests: &[RateRequest]) -> RateMap {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let mut map = RateMap::new();
        for request in requests {
            map.insert(*request, self.rate.clone());
        }
        map
    }
}

fn build_engine(upstream: Arc<LatentUpstream>, quota: u64) -> RateCacheEngine {
    let kv: Arc<dyn KvStore> = Arc::new(InMemoryKvStore::new());
    // 10 retries x 20ms covers the 100ms latency `LatentUpstream` simulates
    // in `s5_concurrent_miss_coalescing` below, so a losing waiter's retry
    // budget actually outlasts the winner's hold on the lock instead of
    // giving up early.
    let lock = DistributedLock::new(kv.clone(), Duration::from_secs(5), 10, Duration::from_millis(20));
    let accountant = QuotaAccountant::new(kv.clone(), quota);
    RateCacheEngine::new(kv, lock, upstream, accountant, Duration::from_secs(300))
}

/// S4 - seed the registry with three keys for one hotel/room across three
/// periods, run one revalidator cycle, and expect exactly one upstream
/// batch call covering all three with zero errors.
#[tokio::test]
async fn s4_revalidator_batch_issues_one_call_for_three_registered_keys() {
    let upstream = Arc::new(LatentUpstream {
        calls: AtomicUsize::new(0),
        latency: Duration::ZERO,
        rate: Rate::new("12000"),
    });
    let engine = build_engine(upstream.clone(), 1000);

    for period in [Period::Summer, Period::Winter, Period::Autumn] {
        engine
            .get_rate(RateRequest::new(period, Hotel::FloatingPointResort, Room::SingletonRoom))
            .await
            .unwrap();
    }
    // Three cold misses, three upstream calls so far.
    assert_eq!(upstream.calls.load(Ordering::SeqCst), 3);

    let tally = engine.refresh_all().await;
    assert_eq!(tally, RefreshTally { updated: 3, errors: 0 });
    // Exactly one more call: the batch revalidation round trip.
    assert_eq!(upstream.calls.load(Ordering::SeqCst), 4);
}

/// S5 - 100 simultaneous identical requests against an empty cache must
/// coalesce into a single upstream call, all returning the same rate.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn s5_concurrent_miss_coalescing() {
    let upstream = Arc::new(LatentUpstream {
        calls: AtomicUsize::new(0),
        latency: Duration::from_millis(100),
        rate: Rate::new("9000"),
    });
    let engine = Arc::new(build_engine(upstream.clone(), 1000));

    let mut handles = Vec::with_capacity(100);
    for _ in 0..100 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine
                .get_rate(RateRequest::new(Period::Summer, Hotel::FloatingPointResort, Room::SingletonRoom))
                .await
                .unwrap()
        }));
    }

    let mut results = Vec::with_capacity(100);
    for handle in handles {
        results.push(handle.await.unwrap());
    }

    assert_eq!(upstream.calls.load(Ordering::SeqCst), 1);
    assert!(results.iter().all(|r| *r == Some(Rate::new("9000"))));
}

/// S6 - an empty (or absent) registry makes the revalidator a no-op: no
/// upstream call, a zeroed tally.
#[tokio::test]
async fn s6_revalidator_on_empty_registry_makes_no_upstream_call() {
    let upstream = Arc::new(LatentUpstream {
        calls: AtomicUsize::new(0),
        latency: Duration::ZERO,
        rate: Rate::new("1"),
    });
    let engine = build_engine(upstream.clone(), 1000);

    let tally = engine.refresh_all().await;
    assert_eq!(tally, RefreshTally { updated: 0, errors: 0 });
    assert_eq!(upstream.calls.load(Ordering::SeqCst), 0);
}
