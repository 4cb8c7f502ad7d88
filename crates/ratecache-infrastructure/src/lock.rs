//! The distributed lock (C2): per-key mutual exclusion across replicas,
//! built on the KV store's `set_if_absent`/`delete_if_value_matches`
//! primitives rather than anything Redis-specific.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::kv::KvStore;

/// A held lock. Releasing is a compare-and-delete against the unique token
/// this guard was issued, so a guard can never release a lock some other
/// holder has since acquired after this one's lease expired.
pub struct LockGuard {
    store: Arc<dyn KvStore>,
    key: String,
    token: String,
    released: bool,
}

impl LockGuard {
    /// Release the lock now, returning whether this guard actually held it
    /// (a `false` here means the lease had already expired and a different
    /// holder has since taken the key).
    pub async fn release(mut self) -> Result<bool> {
        self.released = true;
        self.store.delete_if_value_matches(&self.key, &self.token).await
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let store = self.store.clone();
        let key = self.key.clone();
        let token = self.token.clone();
        tokio::spawn(async move {
            if let Err(err) = store.delete_if_value_matches(&key, &token).await {
                warn!(%key, error = %err, "failed to release lock on drop");
            }
        });
    }
}

/// Acquires and releases per-key locks with the `T_l` lease and retry
/// policy given at construction.
pub struct DistributedLock {
    store: Arc<dyn KvStore>,
    ttl: Duration,
    retry_count: u32,
    retry_delay: Duration,
}

impl DistributedLock {
    /// Build a lock manager over `store`, leasing for `ttl` and retrying
    /// `retry_count` times with `retry_delay` between attempts (clamped to
    /// the lease's remaining time, never sleeping past it).
    pub fn new(store: Arc<dyn KvStore>, ttl: Duration, retry_count: u32, retry_delay: Duration) -> Self {
        Self {
            store,
            ttl,
            retry_count,
            retry_delay,
        }
    }

    /// Attempt to acquire the lock once, without retrying.
    pub async fn try_acquire(&self, key: &str) -> Result<Option<LockGuard>> {
        let token = Uuid::new_v4().to_string();
        let acquired = self.store.set_if_absent(key, &token, self.ttl).await?;
        if acquired {
            debug!(key, "lock acquired");
            Ok(Some(LockGuard {
                store: self.store.clone(),
                key: key.to_string(),
                token,
                released: false,
            }))
        } else {
            debug!(key, "lock already held");
            Ok(None)
        }
    }

    /// Attempt to acquire the lock, retrying on contention up to
    /// `retry_count` additional times. Each retry sleeps for
    /// `min(retry_delay, remaining lease time)`, so a caller never sleeps
    /// past the point the current holder's lease is guaranteed to expire.
    pub async fn acquire_with_retry(&self, key: &str) -> Result<Option<LockGuard>> {
        let deadline = Instant::now() + self.ttl;
        if let Some(guard) = self.try_acquire(key).await? {
            return Ok(Some(guard));
        }

        for _ in 0..self.retry_count {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            let sleep_for = self.retry_delay.min(remaining);
            tokio::time::sleep(sleep_for).await;

            if let Some(guard) = self.try_acquire(key).await? {
                return Ok(Some(guard));
            }
        }

        Ok(None)
    }

    /// Run `body` under `resource`'s lock, retrying acquisition per this
    /// lock's configured policy. `body` never runs if acquisition is
    /// exhausted (returns `None`) or fails outright; the lock is released
    /// on every exit path once `body` has run, including `body` panicking
    /// — the panic unwinds through this call, dropping the still-held
    /// [`LockGuard`], whose `Drop` impl releases it.
    pub async fn with_lock<F, Fut, T>(&self, resource: &str, body: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let guard = match self.acquire_with_retry(resource).await {
            Ok(Some(guard)) => guard,
            Ok(None) => return None,
            Err(err) => {
                warn!(resource, error = %err, "lock acquisition failed");
                return None;
            }
        };

        let result = body().await;
        let _ = guard.release().await;
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::InMemoryKvStore;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[tokio::test]
    async fn second_acquire_fails_while_first_is_held() {
        let store: Arc<dyn KvStore> = Arc::new(InMemoryKvStore::new());
        let lock = DistributedLock::new(store, Duration::from_millis(500), 0, Duration::from_millis(10));

        let guard = lock.try_acquire("k").await.unwrap();
        assert!(guard.is_some());
        assert!(lock.try_acquire("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn release_frees_the_key_for_reacquisition() {
        let store: Arc<dyn KvStore> = Arc::new(InMemoryKvStore::new());
        let lock = DistributedLock::new(store, Duration::from_millis(500), 0, Duration::from_millis(10));

        let guard = lock.try_acquire("k").await.unwrap().unwrap();
        assert!(guard.release().await.unwrap());
        assert!(lock.try_acquire("k").await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn retry_eventually_succeeds_once_the_holder_releases() {
        let store: Arc<dyn KvStore> = Arc::new(InMemoryKvStore::new());
        let lock = Arc::new(DistributedLock::new(
            store,
            Duration::from_millis(200),
            5,
            Duration::from_millis(20),
        ));

        let held = lock.try_acquire("k").await.unwrap().unwrap();

        let waiter = {
            let lock = lock.clone();
            tokio::spawn(async move { lock.acquire_with_retry("k").await.unwrap() })
        };

        tokio::time::advance(Duration::from_millis(25)).await;
        held.release().await.unwrap();
        tokio::time::advance(Duration::from_millis(25)).await;

        let result = waiter.await.unwrap();
        assert!(result.is_some());
    }

    #[tokio::test]
    async fn with_lock_runs_body_and_releases_on_success() {
        let store: Arc<dyn KvStore> = Arc::new(InMemoryKvStore::new());
        let lock = DistributedLock::new(store, Duration::from_millis(500), 0, Duration::from_millis(10));

        let result = lock.with_lock("k", || async { 42 }).await;
        assert_eq!(result, Some(42));

        // Released: a fresh acquire succeeds immediately.
        assert!(lock.try_acquire("k").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn with_lock_never_runs_body_when_acquire_is_exhausted() {
        let store: Arc<dyn KvStore> = Arc::new(InMemoryKvStore::new());
        let lock = DistributedLock::new(store, Duration::from_millis(500), 0, Duration::from_millis(10));

        let _held = lock.try_acquire("k").await.unwrap().unwrap();

        let ran = Arc::new(AtomicBool::new(false));
        let ran_clone = ran.clone();
        let result = lock
            .with_lock("k", || async move {
                ran_clone.store(true, Ordering::SeqCst);
            })
            .await;

        assert!(result.is_none());
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn with_lock_releases_even_when_body_panics() {
        let store: Arc<dyn KvStore> = Arc::new(InMemoryKvStore::new());
        let lock = Arc::new(DistributedLock::new(store, Duration::from_millis(500), 0, Duration::from_millis(10)));

        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let lock_clone = lock.clone();
        let task = tokio::spawn(async move {
            lock_clone
                .with_lock("k", || async move {
                    calls_clone.fetch_add(1, Ordering::SeqCst);
                    panic!("body blew up");
                })
                .await
        });

        assert!(task.await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // `LockGuard::drop` spawns its release as a detached task; give it a
        // turn to run before asserting the key is free again.
        tokio::task::yield_now().await;
        for _ in 0..50 {
            if lock.try_acquire("k").await.unwrap().is_some() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("lock was never released after the body panicked");
    }
}
