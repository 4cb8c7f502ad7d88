//! Core domain model for the rate-proxying cache.
//!
//! This crate defines the bounded tuple domain the cache serves rates for,
//! the canonical key encoding used to address both the cache entry and the
//! cross-replica registry, and the validation errors produced when a client
//! request falls outside the enumerated domain.
//!
//! Nothing in this crate talks to Redis, HTTP, or any other transport —
//! it is pure data and pure functions, the same way the upstream project
//! keeps its domain layer free of infrastructure concerns.

#![warn(missing_docs)]

pub mod errors;
pub mod key;
pub mod rate;
pub mod storage_keys;
pub mod tuple;

pub use errors::{FieldError, ValidationErrors};
pub use key::{KeyDecodeError, RateKey};
pub use rate::Rate;
pub use tuple::{Hotel, Period, RateRequest, Room};
