//! The KV store adapter (C1): the single shared mutable resource every
//! replica talks to.
//!
//! [`KvStore`] exposes exactly the primitives the engine and the
//! distributed lock need, not a general Redis wrapper — `get`/`set_with_ttl`
//! for cache entries, `incr` for the quota and hit counters, `sadd`/
//! `smembers` for the registry, and `set_if_absent`/
//! `delete_if_value_matches` for the lock's acquire/release pair.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

use crate::error::{Error, Result};

/// Abstraction over the distributed KV store, so the engine can be tested
/// against an in-memory fake without a live Redis.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read a string value.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a string value with an expiry.
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Delete a key unconditionally. Returns whether a key was removed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Atomically increment a counter, creating it at 0 first if absent.
    async fn incr(&self, key: &str) -> Result<i64>;

    /// Add a member to a set.
    async fn sadd(&self, key: &str, member: &str) -> Result<()>;

    /// List all members of a set.
    async fn smembers(&self, key: &str) -> Result<Vec<String>>;

    /// Set a value only if the key is currently absent, with an expiry.
    /// Returns whether the value was set (i.e. whether the key was absent).
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool>;

    /// Delete a key only if its current value equals `expected`, atomically.
    /// Returns whether the key was deleted.
    async fn delete_if_value_matches(&self, key: &str, expected: &str) -> Result<bool>;

    /// Cheap liveness probe for the health endpoint.
    async fn health_check(&self) -> Result<bool>;
}

/// Redis-backed [`KvStore`].
pub struct RedisKvStore {
    connection: ConnectionManager,
}

impl RedisKvStore {
    /// Connect to Redis at `url`.
    #[instrument(skip(url))]
    pub async fn connect(url: &str) -> Result<Self> {
        let client = Client::open(url).map_err(Error::Cache)?;
        let connection = ConnectionManager::new(client).await.map_err(Error::Cache)?;
        Ok(Self { connection })
    }

    fn conn(&self) -> ConnectionManager {
        self.connection.clone()
    }
}

const COMPARE_AND_DELETE: &str = r#"
if redis.call("get", KEYS[1]) == ARGV[1] then
    return redis.call("del", KEYS[1])
else
    return 0
end
"#;

#[async_trait]
impl KvStore for RedisKvStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn();
        let value: Option<String> = conn.get(key).await.map_err(Error::Cache)?;
        debug!(key, hit = value.is_some(), "kv get");
        Ok(value)
    }

    #[instrument(skip(self, value))]
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn();
        let millis = ttl.as_millis().max(1) as u64;
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(millis)
            .query_async(&mut conn)
            .await
            .map_err(Error::Cache)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn();
        let deleted: u64 = conn.del(key).await.map_err(Error::Cache)?;
        Ok(deleted > 0)
    }

    #[instrument(skip(self))]
    async fn incr(&self, key: &str) -> Result<i64> {
        let mut conn = self.conn();
        conn.incr(key, 1).await.map_err(Error::Cache)
    }

    #[instrument(skip(self))]
    async fn sadd(&self, key: &str, member: &str) -> Result<()> {
        let mut conn = self.conn();
        let _: () = conn.sadd(key, member).await.map_err(Error::Cache)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        let mut conn = self.conn();
        conn.smembers(key).await.map_err(Error::Cache)
    }

    #[instrument(skip(self, value))]
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.conn();
        let acquired: bool = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("PX")
            .arg(ttl.as_millis() as u64)
            .query_async(&mut conn)
            .await
            .map_err(Error::Cache)?;
        Ok(acquired)
    }

    #[instrument(skip(self, expected))]
    async fn delete_if_value_matches(&self, key: &str, expected: &str) -> Result<bool> {
        let mut conn = self.conn();
        let released: i32 = redis::cmd("EVAL")
            .arg(COMPARE_AND_DELETE)
            .arg(1)
            .arg(key)
            .arg(expected)
            .query_async(&mut conn)
            .await
            .map_err(Error::Cache)?;
        Ok(released == 1)
    }

    async fn health_check(&self) -> Result<bool> {
        let mut conn = self.conn();
        let response: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(Error::Cache)?;
        Ok(response == "PONG")
    }
}

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

/// In-memory [`KvStore`] used by tests so the engine's SWR and coalescing
/// logic can be exercised without a live Redis.
#[derive(Default)]
pub struct InMemoryKvStore {
    strings: Mutex<HashMap<String, Entry>>,
    sets: Mutex<HashMap<String, Vec<String>>>,
}

impl InMemoryKvStore {
    /// Construct an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn is_live(entry: &Entry) -> bool {
        entry.expires_at.map_or(true, |at| at > Instant::now())
    }
}

#[async_trait]
impl KvStore for InMemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut strings = self.strings.lock().unwrap();
        match strings.get(key) {
            Some(entry) if Self::is_live(entry) => Ok(Some(entry.value.clone())),
            Some(_) => {
                strings.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut strings = self.strings.lock().unwrap();
        strings.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut strings = self.strings.lock().unwrap();
        Ok(strings.remove(key).is_some())
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let mut strings = self.strings.lock().unwrap();
        let entry = strings.entry(key.to_string()).or_insert_with(|| Entry {
            value: "0".to_string(),
            expires_at: None,
        });
        let next: i64 = entry.value.parse().unwrap_or(0) + 1;
        entry.value = next.to_string();
        Ok(next)
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<()> {
        let mut sets = self.sets.lock().unwrap();
        let members = sets.entry(key.to_string()).or_default();
        if !members.iter().any(|m| m == member) {
            members.push(member.to_string());
        }
        Ok(())
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        let sets = self.sets.lock().unwrap();
        Ok(sets.get(key).cloned().unwrap_or_default())
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let mut strings = self.strings.lock().unwrap();
        let absent = match strings.get(key) {
            Some(entry) => !Self::is_live(entry),
            None => true,
        };
        if absent {
            strings.insert(
                key.to_string(),
                Entry {
                    value: value.to_string(),
                    expires_at: Some(Instant::now() + ttl),
                },
            );
        }
        Ok(absent)
    }

    async fn delete_if_value_matches(&self, key: &str, expected: &str) -> Result<bool> {
        let mut strings = self.strings.lock().unwrap();
        let matches = strings
            .get(key)
            .map(|entry| Self::is_live(entry) && entry.value == expected)
            .unwrap_or(false);
        if matches {
            strings.remove(key);
        }
        Ok(matches)
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}
