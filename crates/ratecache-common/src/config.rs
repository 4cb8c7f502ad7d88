//! Environment-backed configuration shared by the API server and the
//! revalidator binary.
//!
//! Required variables abort start-up with a descriptive error rather than
//! silently falling back to a default — a missing `REDIS_URL` or upstream
//! credential is a deploy-time mistake, not a runtime condition to degrade
//! through.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration shared by both binaries in this workspace: how to reach
/// Redis and the upstream pricing oracle, and the cache's timing constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Redis connection string. Required.
    pub redis_url: String,

    /// Base URL of the upstream pricing oracle. Required.
    pub upstream_url: String,

    /// Bearer token presented to the upstream pricing oracle. Required.
    pub upstream_token: String,

    /// Daily call quota enforced against the upstream oracle. Required.
    pub upstream_quota: u64,

    /// T_c: how long a cached rate (including a cached ∅) stays fresh,
    /// in milliseconds.
    pub cache_ttl_ms: u64,

    /// T_r: interval between revalidator sweeps, in milliseconds.
    pub revalidate_interval_ms: u64,

    /// T_l: distributed lock lease duration, in milliseconds.
    pub lock_ttl_ms: u64,

    /// Timeout applied to each upstream HTTP call, in milliseconds.
    pub upstream_timeout_ms: u64,

    /// Number of times a caller retries acquiring a held lock before
    /// surfacing `ServiceUnavailable(lock_unavailable)`.
    pub lock_retry_count: u32,

    /// Delay between lock-acquisition retries, in milliseconds, clamped to
    /// the lock's remaining lease at the moment of each retry.
    pub lock_retry_delay_ms: u64,

    /// Log level passed to the tracing `EnvFilter` when `RUST_LOG` is unset.
    pub log_level: String,

    /// Emit logs as JSON instead of pretty human-readable text.
    pub log_json: bool,
}

impl CoreConfig {
    /// Load configuration from the environment, failing loudly if any
    /// required variable is missing or blank.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            redis_url: required_env("REDIS_URL")?,
            upstream_url: required_env("RATE_API_URL")?,
            upstream_token: required_env("RATE_API_TOKEN")?,
            upstream_quota: required_env("RATE_API_QUOTA")?
                .parse()
                .context("RATE_API_QUOTA must be a non-negative integer")?,
            cache_ttl_ms: optional_env_parsed("CACHE_TTL_MS", 300_000),
            revalidate_interval_ms: optional_env_parsed("REVALIDATE_INTERVAL_MS", 120_000),
            lock_ttl_ms: optional_env_parsed("LOCK_TTL_MS", 30_000),
            upstream_timeout_ms: optional_env_parsed("UPSTREAM_TIMEOUT_MS", 20_000),
            lock_retry_count: optional_env_parsed("LOCK_RETRY_COUNT", 2),
            lock_retry_delay_ms: optional_env_parsed("LOCK_RETRY_DELAY_MS", 100),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_json: optional_env_parsed("LOG_JSON", false),
        })
    }

    /// `T_c` as a [`Duration`].
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    /// `T_r` as a [`Duration`].
    pub fn revalidate_interval(&self) -> Duration {
        Duration::from_millis(self.revalidate_interval_ms)
    }

    /// `T_l` as a [`Duration`].
    pub fn lock_ttl(&self) -> Duration {
        Duration::from_millis(self.lock_ttl_ms)
    }

    /// Upstream call timeout as a [`Duration`].
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }

    /// Delay between lock retries as a [`Duration`].
    pub fn lock_retry_delay(&self) -> Duration {
        Duration::from_millis(self.lock_retry_delay_ms)
    }
}

fn required_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        Ok(_) => bail!("{name} is set but blank; a real value is required"),
        Err(_) => bail!("{name} is required but not set"),
    }
}

fn optional_env_parsed<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
