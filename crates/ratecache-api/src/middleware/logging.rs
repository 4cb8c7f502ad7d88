//! Structured request logging: one `info!`/`warn!` line per request, keyed
//! by the correlation id the request-id middleware assigned.

use std::time::Instant;

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use tracing::{info, warn};

use super::request_id::RequestId;

/// Logs method, path, status, and latency for every request. Must run
/// after [`super::request_id::request_id_middleware`] in the layer stack so
/// the [`RequestId`] extension is already present on the incoming request.
pub async fn logging_middleware(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map(|id| id.as_str().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let response = next.run(req).await;

    let status = response.status();
    let duration_ms = start.elapsed().as_millis() as u64;

    if status.is_server_error() {
        warn!(%request_id, %method, %path, %status, duration_ms, "request failed");
    } else {
        info!(%request_id, %method, %path, %status, duration_ms, "request completed");
    }

    response
}
