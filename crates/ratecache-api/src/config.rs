//! HTTP-server-specific configuration, layered on top of
//! [`ratecache_common::CoreConfig`]'s shared Redis/upstream/timing settings.

use anyhow::Result;
use ratecache_common::CoreConfig;

/// Everything the API binary needs at start-up: the shared core config plus
/// the bind address.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Shared Redis/upstream/timing configuration.
    pub core: CoreConfig,
    /// Host to bind the HTTP listener to.
    pub host: String,
    /// Port to bind the HTTP listener to.
    pub port: u16,
}

impl ApiConfig {
    /// Load from the environment, failing loudly on a missing required
    /// variable (see [`CoreConfig::from_env`]).
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            core: CoreConfig::from_env()?,
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8080),
        })
    }

    /// The address to bind the HTTP listener to, as `"host:port"`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
