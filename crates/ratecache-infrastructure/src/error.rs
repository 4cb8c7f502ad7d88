//! Infrastructure-level errors: everything that can go wrong talking to
//! Redis or the upstream pricing oracle.
//!
//! This is the "TransportError" of the cache engine's error model. Nothing
//! above this crate ever forwards one of these to a client directly — the
//! engine absorbs or translates it per its own policy.

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Infrastructure-level failure.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failure talking to the KV store.
    #[error("cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// Failure talking to the upstream pricing oracle.
    #[error("upstream transport error: {0}")]
    Upstream(#[from] reqwest::Error),

    /// Failure encoding or decoding a cached value.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Upstream responded, but not with something we can use.
    #[error("upstream returned an unexpected response: {0}")]
    UpstreamProtocol(String),
}
