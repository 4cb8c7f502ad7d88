//! `GET /healthz` (C8): a read-only aggregation that never fails — any
//! internal error degrades a boolean field rather than the response code.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
struct RedisStatus {
    ok: bool,
}

#[derive(Debug, Serialize)]
struct Metrics {
    quota: u64,
    rate_api_calls_used: u64,
    rate_api_calls_remaining: i64,
    has_quota_remaining: bool,
    hit_count: u64,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    redis: RedisStatus,
    metrics: Metrics,
}

/// Handle `GET /healthz`. Always returns 200.
pub async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let report = state.health.report().await;

    Json(HealthResponse {
        status: if report.healthy { "ok" } else { "degraded" },
        redis: RedisStatus {
            ok: report.kv_reachable,
        },
        metrics: Metrics {
            quota: report.quota,
            rate_api_calls_used: report.calls_used,
            rate_api_calls_remaining: report.calls_remaining,
            has_quota_remaining: report.has_quota_remaining,
            hit_count: report.hit_count,
        },
    })
}
