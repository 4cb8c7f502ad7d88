//! Shared application state, threaded through every route handler via
//! Axum's `State` extractor.

use std::sync::Arc;

use ratecache_engine::{HealthReporter, RateCacheEngine};
use ratecache_infrastructure::KvStore;

/// Everything a request handler needs: the engine that answers pricing
/// requests and the KV store used only to bump the hit counter on success.
#[derive(Clone)]
pub struct AppState {
    /// The rate cache engine (C5).
    pub engine: Arc<RateCacheEngine>,
    /// Health aggregation (C8).
    pub health: Arc<HealthReporter>,
    /// The KV store, used directly only for the hit counter (§4.7).
    pub kv: Arc<dyn KvStore>,
}

impl AppState {
    /// Build application state from its already-constructed dependencies.
    pub fn new(engine: Arc<RateCacheEngine>, health: Arc<HealthReporter>, kv: Arc<dyn KvStore>) -> Self {
        Self { engine, health, kv }
    }
}
