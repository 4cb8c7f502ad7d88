//! `GET /pricing` — the request handler (C7): maps a validated
//! `(period, hotel, room)` to a [`ratecache_engine::RateCacheEngine::get_rate`]
//! call and renders the result (or failure) as the external contract in
//! spec §6 describes.

use axum::{
    extract::{OriginalUri, Query, State},
    http::Uri,
    response::{IntoResponse, Response},
    Extension, Json,
};
use ratecache_common::validation::validate_request;
use ratecache_domain::storage_keys::HIT_COUNT_KEY;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ApiError;
use crate::middleware::RequestId;
use crate::state::AppState;

/// Raw, untyped query parameters. Each field is optional so a missing
/// parameter is reported as a validation error (`""` fails every
/// enumeration check) rather than an opaque 422 from the extractor.
#[derive(Debug, Deserialize)]
pub struct PricingQuery {
    period: Option<String>,
    hotel: Option<String>,
    room: Option<String>,
}

#[derive(Debug, Serialize)]
struct PricingResponse {
    rate: Option<String>,
}

/// Handle `GET /pricing?period=&hotel=&room=`.
pub async fn get_pricing(
    State(state): State<AppState>,
    Query(query): Query<PricingQuery>,
    OriginalUri(uri): OriginalUri,
    Extension(request_id): Extension<RequestId>,
) -> Response {
    let period = query.period.unwrap_or_default();
    let hotel = query.hotel.unwrap_or_default();
    let room = query.room.unwrap_or_default();

    let request = match validate_request(&period, &hotel, &room) {
        Ok(request) => request,
        Err(errors) => return problem_response(ApiError::from(errors), &uri, &request_id),
    };

    match state.engine.get_rate(request).await {
        Ok(rate) => {
            if let Err(err) = state.kv.incr(HIT_COUNT_KEY).await {
                warn!(error = %err, "failed to increment hit counter");
            }
            Json(PricingResponse {
                rate: rate.map(|r| r.as_str().to_string()),
            })
            .into_response()
        }
        Err(engine_err) => problem_response(ApiError::from(engine_err), &uri, &request_id),
    }
}

fn problem_response(error: ApiError, uri: &Uri, request_id: &RequestId) -> Response {
    let status = error.status();
    let problem = error.to_problem(uri.to_string(), request_id.as_str().to_string());
    (status, Json(problem)).into_response()
}
