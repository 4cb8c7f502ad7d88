//! The cached rate value.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A rate, carried as the stable scalar returned by the upstream pricing
/// oracle.
///
/// Stored as a string rather than a numeric type so the cache never alters
/// precision or formatting: whatever the upstream sent must round-trip
/// unchanged through a cache hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rate(pub String);

impl Rate {
    /// Wrap a raw upstream value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the underlying scalar.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Rate {
    fn from(value: String) -> Self {
        Self(value)
    }
}
