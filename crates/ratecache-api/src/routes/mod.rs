//! HTTP route handlers, one module per external endpoint (spec §6).

pub mod health;
pub mod pricing;

use axum::{routing::get, Router};

use crate::state::AppState;

/// Build the full set of externally-exposed routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pricing", get(pricing::get_pricing))
        .route("/healthz", get(health::get_health))
}
