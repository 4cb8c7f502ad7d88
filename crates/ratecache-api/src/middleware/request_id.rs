//! Request-id middleware: stamps every request with a correlation id used
//! both in logs and in the `traceId` field of RFC 7807 problem documents.

use axum::{body::Body, http::HeaderValue, http::Request, middleware::Next, response::Response};
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation id carried in request extensions for the lifetime of one
/// request/response cycle.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    /// Borrow the underlying id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Accepts an incoming `x-request-id` header, or mints a fresh one, stores
/// it in request extensions, and echoes it back on the response.
pub async fn request_id_middleware(mut req: Request<Body>, next: Next) -> Response {
    let id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut response = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
