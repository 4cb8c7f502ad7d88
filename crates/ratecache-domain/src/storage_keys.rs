//! Fixed KV key names and helpers, matching the persisted-state layout in
//! spec.md §6.

use crate::key::RateKey;

/// The registry set: holds every `K` with a currently-live cache entry.
pub const REGISTRY_KEY: &str = "rate_cache_keys";

/// Monotonic counter tracking upstream calls made against the daily quota.
pub const QUOTA_KEY: &str = "rate_api:calls";

/// Monotonic counter tracking total cache hits, exposed for operational
/// visibility only.
pub const HIT_COUNT_KEY: &str = "hit_count";

/// Build the lock key for a given rate key.
pub fn lock_key(key: &RateKey) -> String {
    format!("lock:{key}")
}

/// Build the cache-entry key for a given rate key. The rate key itself
/// doubles as the cache key; this helper exists so call sites never embed
/// the identity transform inline.
pub fn cache_key(key: &RateKey) -> String {
    key.as_str().to_string()
}
