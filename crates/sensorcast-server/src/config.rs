//! Server configuration.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use sensorcast_config::{Environment, SecurityConfig};

use crate::stream::StreamSettings;

/// Default admission capacity.
pub const DEFAULT_MAX_CONNECTIONS: usize = 10_000;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to.
    pub bind_address: SocketAddr,

    /// Deployment environment reported by `/health` and `/api/environment`.
    pub env: Environment,

    /// Identifier stamped on every streamed event.
    pub server_id: String,

    /// Maximum simultaneously admitted `/api` requests, open streams included.
    pub max_connections: usize,

    /// Enable per-client request rate limiting.
    pub rate_limiting: bool,

    /// Sustained request rate for each client.
    pub requests_per_second: u32,

    /// Requests allowed in a burst above the sustained rate.
    pub burst: u32,

    /// Enable request logging.
    pub request_logging: bool,

    /// CORS allowed origins. `"*"` (or empty) allows any origin.
    pub cors_origins: Vec<String>,

    /// Directory served for paths no route matches.
    pub static_path: Option<PathBuf>,

    /// Security response headers.
    pub security: SecurityConfig,

    /// Event stream cadence.
    pub stream: StreamSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080)),
            env: Environment::Dev,
            server_id: "unknown".to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            rate_limiting: true,
            requests_per_second: DEFAULT_MAX_CONNECTIONS as u32,
            burst: (DEFAULT_MAX_CONNECTIONS + DEFAULT_MAX_CONNECTIONS / 2) as u32,
            request_logging: true,
            cors_origins: vec!["*".to_string()],
            static_path: None,
            security: SecurityConfig::default(),
            stream: StreamSettings::default(),
        }
    }
}

impl ServerConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bind address.
    pub fn with_bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = addr;
        self
    }

    pub fn with_env(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }

    pub fn with_server_id(mut self, server_id: impl Into<String>) -> Self {
        self.server_id = server_id.into();
        self
    }

    /// Set the admission capacity.
    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Enable or disable rate limiting.
    pub fn with_rate_limiting(mut self, enabled: bool) -> Self {
        self.rate_limiting = enabled;
        self
    }

    /// Set the rate limit quota.
    pub fn with_rate_limit(mut self, requests_per_second: u32, burst: u32) -> Self {
        self.requests_per_second = requests_per_second;
        self.burst = burst;
        self
    }

    /// Enable or disable request logging.
    pub fn with_request_logging(mut self, enabled: bool) -> Self {
        self.request_logging = enabled;
        self
    }

    /// Set CORS allowed origins.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    /// Serve static files from `path` for unmatched routes.
    pub fn with_static_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.static_path = Some(path.into());
        self
    }

    pub fn with_security(mut self, security: SecurityConfig) -> Self {
        self.security = security;
        self
    }

    pub fn with_stream(mut self, stream: StreamSettings) -> Self {
        self.stream = stream;
        self
    }
}
