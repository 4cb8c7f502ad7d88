//! Infrastructure adapters: the only layer in this workspace that talks to
//! Redis or the upstream pricing oracle over the network.
//!
//! Everything here is reachable through a trait (`KvStore`, `UpstreamClient`)
//! so the engine crate can be exercised against in-memory fakes in tests.

#![warn(missing_docs)]

pub mod error;
pub mod kv;
pub mod lock;
pub mod quota;
pub mod upstream;

pub use error::{Error, Result};
pub use kv::{InMemoryKvStore, KvStore, RedisKvStore};
pub use lock::{DistributedLock, LockGuard};
pub use quota::QuotaAccountant;
pub use upstream::{HttpUpstreamClient, UpstreamClient};
