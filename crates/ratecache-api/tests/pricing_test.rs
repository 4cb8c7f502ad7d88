//! Integration tests driving the `/pricing` and `/healthz` routes end to
//! end against in-memory fakes, exercising spec.md §8 scenarios S1-S3.

use std::sync::{atomic::AtomicUsize, atomic::Ordering, Arc};
use std::time::Duration;

use async_trait::async_trait;
use axum::{body::Body, http::Request};
use http_body_util::BodyExt;
use ratecache_api::{routes, AppState};
use ratecache_domain::{Hotel, Period, Rate, RateRequest, Room};
use ratecache_engine::{HealthReporter, RateCacheEngine};
use ratecache_infrastructure::upstream::{RateMap, UpstreamClient};
use ratecache_infrastructure::{DistributedLock, InMemoryKvStore, KvStore, QuotaAccountant};
use tower::ServiceExt;

struct StubUpstream {
    calls: AtomicUsize,
    rate: Option<Rate>,
}

#[async_trait]
impl UpstreamClient for StubUpstream {
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

fn build_state(quota: u64, upstream: Arc<StubUpstream>) -> AppState {
    let kv: Arc<dyn KvStore> = Arc::new(InMemoryKvStore::new());
    let lock = DistributedLock::new(kv.clone(), Duration::from_secs(5), 2, Duration::from_millis(10));
    let quota_accountant = QuotaAccountant::new(kv.clone(), quota);
    let health_quota = Arc::new(quota_accountant.clone());
    let engine = Arc::new(RateCacheEngine::new(
        kv.clone(),
        lock,
        upstream,
        quota_accountant,
        Duration::from_secs(300),
    ));
    let health = Arc::new(HealthReporter::new(kv.clone(), health_quota));
    AppState::new(engine, health, kv)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn s1_cold_miss_then_hit() {
    let upstream = Arc::new(StubUpstream {
        calls: AtomicUsize::new(0),
        rate: Some(Rate::new("12000")),
    });
    let state = build_state(1000, upstream);
    let app = routes::routes().with_state(state);

    let request = Request::builder()
        .uri("/pricing?period=Summer&hotel=FloatingPointResort&room=SingletonRoom")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), 200);
    let body = body_json(response).await;
    assert_eq!(body["rate"], "12000");

    let request = Request::builder()
        .uri("/pricing?period=Summer&hotel=FloatingPointResort&room=SingletonRoom")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), 200);

    let health_request = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
    let health_response = app.oneshot(health_request).await.unwrap();
    let health = body_json(health_response).await;
    assert_eq!(health["metrics"]["rate_api_calls_used"], 1);
    assert_eq!(health["metrics"]["hit_count"], 2);
}

#[tokio::test]
async fn s2_validation_failure_reports_only_the_bad_field() {
    let upstream = Arc::new(StubUpstream {
        calls: AtomicUsize::new(0),
        rate: Some(Rate::new("12000")),
    });
    let state = build_state(1000, upstream);
    let app = routes::routes().with_state(state);

    let request = Request::builder()
        .uri("/pricing?period=summer-2024&hotel=FloatingPointResort&room=SingletonRoom")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), 400);

    let body = body_json(response).await;
    assert_eq!(
        body["errors"]["period"],
        serde_json::json!(["The period field must be one of: Summer, Autumn, Winter, Spring."])
    );
    assert!(body["errors"].get("hotel").is_none());
    assert!(body["errors"].get("room").is_none());
}

#[tokio::test]
async fn s3_quota_exhausted_yields_503_without_an_upstream_call() {
    let upstream = Arc::new(StubUpstream {
        calls: AtomicUsize::new(0),
        rate: Some(Rate::new("12000")),
    });
    let state = build_state(0, upstream.clone());
    let app = routes::routes().with_state(state);

    let request = Request::builder()
        .uri("/pricing?period=Summer&hotel=FloatingPointResort&room=SingletonRoom")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), 503);

    let body = body_json(response).await;
    assert!(body["title"].as_str().unwrap().contains("Service Temporarily Unavailable"));
    assert_eq!(upstream.calls.load(Ordering::SeqCst), 0);
}
