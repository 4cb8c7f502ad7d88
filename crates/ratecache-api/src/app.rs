//! Application builder: assembles the infrastructure stack, the engine, and
//! the Axum router with its middleware, the way the teacher's
//! `api-rest::app::create_app` wires a service together.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{middleware, Router};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use ratecache_engine::{HealthReporter, RateCacheEngine};
use ratecache_infrastructure::{DistributedLock, HttpUpstreamClient, KvStore, QuotaAccountant, RedisKvStore};

use crate::config::ApiConfig;
use crate::middleware::{logging_middleware, request_id_middleware};
use crate::routes;
use crate::state::AppState;

/// The request-path deadline: strictly less than the lock lease `T_l`
/// (spec §5 "Cancellation and timeouts").
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Connect to Redis and the upstream oracle, assemble the engine, and build
/// the full Axum router (`/pricing`, `/healthz`, plus the ambient
/// middleware stack).
pub async fn create_app(config: &ApiConfig) -> Result<Router> {
    let kv: Arc<dyn KvStore> = Arc::new(RedisKvStore::connect(&config.core.redis_url).await?);

    let upstream = Arc::new(HttpUpstreamClient::new(
        config.core.upstream_url.clone(),
        config.core.upstream_token.clone(),
        config.core.upstream_timeout(),
    )?);

    let lock = DistributedLock::new(
        kv.clone(),
        config.core.lock_ttl(),
        config.core.lock_retry_count,
        config.core.lock_retry_delay(),
    );

    let quota = QuotaAccountant::new(kv.clone(), config.core.upstream_quota);
    let health_quota = Arc::new(quota.clone());

    let engine = Arc::new(RateCacheEngine::new(
        kv.clone(),
        lock,
        upstream,
        quota,
        config.core.cache_ttl(),
    ));
    let health = Arc::new(HealthReporter::new(kv.clone(), health_quota));

    let state = AppState::new(engine, health, kv);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::routes().with_state(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CompressionLayer::new())
            .layer(cors)
            .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
            .layer(middleware::from_fn(request_id_middleware))
            .layer(middleware::from_fn(logging_middleware)),
    );

    Ok(app)
}
