//! API configuration.

use std::time::Instant;

use diary_core::ServerConfig;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl ApiConfig {
    /// Creates a new API configuration with the given host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            start_time: Instant::now(),
        }
    }

    /// Returns the bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl From<&ServerConfig> for ApiConfig {
    fn from(server: &ServerConfig) -> Self {
        Self::new(server.host.clone(), server.port)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new("0.0.0.0", 8080)
    }
}
