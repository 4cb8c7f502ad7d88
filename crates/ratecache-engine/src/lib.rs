//! The rate cache engine: request-path SWR logic (C5), batch revalidation,
//! and read-only health aggregation (C8's data, not its HTTP surface).

#![warn(missing_docs)]

pub mod engine;
pub mod error;
pub mod health;

pub use engine::{RateCacheEngine, RefreshTally};
pub use error::EngineError;
pub use health::{HealthReport, HealthReporter};
