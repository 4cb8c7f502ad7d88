//! The HTTP surface of the rate-proxying cache: `GET /pricing` (C7) and
//! `GET /healthz` (C8's HTTP exposure), built on Axum.
//!
//! Everything that talks to Redis or the upstream oracle lives in
//! `ratecache-infrastructure` and `ratecache-engine`; this crate only maps
//! HTTP requests to engine calls and engine results back to HTTP responses,
//! never bypassing the engine's SWR/coalescing logic.

#![warn(missing_docs)]

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

pub use app::create_app;
pub use config::ApiConfig;
pub use error::ApiError;
pub use state::AppState;
