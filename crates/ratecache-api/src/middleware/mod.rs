//! HTTP middleware: request correlation and structured request logging.
//!
//! Neither concern is named by the specification's component list, but both
//! are ambient engineering carried regardless of the spec's Non-goals (see
//! `SPEC_FULL.md` B.6).

pub mod logging;
pub mod request_id;

pub use logging::logging_middleware;
pub use request_id::{request_id_middleware, RequestId};
