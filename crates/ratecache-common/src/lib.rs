//! Ambient concerns shared by every other crate in this workspace:
//! environment-backed configuration, tracing initialization, and the
//! request validation helpers that turn raw query parameters into the
//! domain's validated tuple types.

#![warn(missing_docs)]

pub mod config;
pub mod telemetry;
pub mod validation;

pub use config::CoreConfig;
pub use telemetry::init_tracing;
