//! Configuration types mapping to the TOML schema.
//!
//! Top-level config:
//! ```toml
//! env = "dev"              # dev | uat | prod
//! [server]                 # listener, admission capacity, CORS, static files
//! [rate_limit]             # per-client request quota
//! [security]               # response security headers
//! [stream]                 # event stream cadence
//! [cache]                  # payload cache TTL and sweep period
//! [sensors]                # simulator cadence
//! [logging]                # log level and sinks
//! ```

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Default port to listen on.
pub const DEFAULT_PORT: u16 = 8080;

/// Default address to bind to.
pub const DEFAULT_BIND: &str = "0.0.0.0";

/// Default number of simultaneously admitted requests.
pub const DEFAULT_MAX_CONNECTIONS: usize = 10_000;

const PORT_RANGE: (u16, u16) = (1024, 65535);
const MAX_CONNECTIONS_RANGE: (usize, usize) = (10, 100_000);
const X_FRAME_OPTIONS: [&str; 3] = ["DENY", "SAMEORIGIN", "ALLOW-FROM"];

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g., project-local
/// overrides) can be loaded and merged. Use the accessor methods to read a
/// section with defaults applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorcastConfig {
    /// Deployment environment.
    pub env: Option<Environment>,

    /// HTTP server settings.
    pub server: Option<ServerConfig>,

    /// Per-client request rate limiting.
    pub rate_limit: Option<RateLimitConfig>,

    /// Security response headers.
    pub security: Option<SecurityConfig>,

    /// Event stream cadence.
    pub stream: Option<StreamConfig>,

    /// Payload cache.
    pub cache: Option<CacheConfig>,

    /// Sensor simulator.
    pub sensors: Option<SensorsConfig>,

    /// Logging.
    pub logging: Option<LoggingConfig>,
}

impl SensorcastConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    ///
    /// Sections are replaced whole, not merged field by field.
    pub fn merge(&mut self, other: SensorcastConfig) {
        if other.env.is_some() {
            self.env = other.env;
        }

        if other.server.is_some() {
            self.server = other.server;
        }

        if other.rate_limit.is_some() {
            self.rate_limit = other.rate_limit;
        }

        if other.security.is_some() {
            self.security = other.security;
        }

        if other.stream.is_some() {
            self.stream = other.stream;
        }

        if other.cache.is_some() {
            self.cache = other.cache;
        }

        if other.sensors.is_some() {
            self.sensors = other.sensors;
        }

        if other.logging.is_some() {
            self.logging = other.logging;
        }
    }

    /// A copy with every section present, defaults filled in.
    pub fn effective(&self) -> SensorcastConfig {
        SensorcastConfig {
            env: Some(self.env()),
            server: Some(self.server()),
            rate_limit: Some(self.rate_limit()),
            security: Some(self.security()),
            stream: Some(self.stream()),
            cache: Some(self.cache()),
            sensors: Some(self.sensors()),
            logging: Some(self.logging()),
        }
    }

    pub fn env(&self) -> Environment {
        self.env.unwrap_or_default()
    }

    pub fn server(&self) -> ServerConfig {
        self.server.clone().unwrap_or_default()
    }

    pub fn rate_limit(&self) -> RateLimitConfig {
        self.rate_limit.clone().unwrap_or_default()
    }

    pub fn security(&self) -> SecurityConfig {
        self.security.clone().unwrap_or_default()
    }

    pub fn stream(&self) -> StreamConfig {
        self.stream.clone().unwrap_or_default()
    }

    pub fn cache(&self) -> CacheConfig {
        self.cache.clone().unwrap_or_default()
    }

    pub fn sensors(&self) -> SensorsConfig {
        self.sensors.clone().unwrap_or_default()
    }

    pub fn logging(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }

    /// Check every value against its accepted range.
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<()> {
        let server = self.server();
        if !(PORT_RANGE.0..=PORT_RANGE.1).contains(&server.port) {
            return Err(ConfigError::invalid(
                "server.port",
                format!(
                    "{} is outside {}..={}",
                    server.port, PORT_RANGE.0, PORT_RANGE.1
                ),
            ));
        }
        if !(MAX_CONNECTIONS_RANGE.0..=MAX_CONNECTIONS_RANGE.1).contains(&server.max_connections) {
            return Err(ConfigError::invalid(
                "server.max_connections",
                format!(
                    "{} is outside {}..={}",
                    server.max_connections, MAX_CONNECTIONS_RANGE.0, MAX_CONNECTIONS_RANGE.1
                ),
            ));
        }
        if server.bind.trim().is_empty() {
            return Err(ConfigError::invalid("server.bind", "must not be empty"));
        }

        let rate_limit = self.rate_limit();
        if rate_limit.requests_per_second == Some(0) {
            return Err(ConfigError::invalid(
                "rate_limit.requests_per_second",
                "must be greater than 0",
            ));
        }
        if rate_limit.burst == Some(0) {
            return Err(ConfigError::invalid("rate_limit.burst", "must be greater than 0"));
        }

        let security = self.security();
        if !X_FRAME_OPTIONS.contains(&security.x_frame_options.as_str()) {
            return Err(ConfigError::invalid(
                "security.x_frame_options",
                format!("must be one of {}", X_FRAME_OPTIONS.join(", ")),
            ));
        }

        let stream = self.stream();
        non_zero("stream.refresh_interval_ms", stream.refresh_interval_ms)?;
        non_zero("stream.keepalive_interval_ms", stream.keepalive_interval_ms)?;
        non_zero("stream.buffer", stream.buffer as u64)?;

        let cache = self.cache();
        non_zero("cache.ttl_secs", cache.ttl_secs)?;
        non_zero("cache.sweep_interval_secs", cache.sweep_interval_secs)?;

        non_zero("sensors.update_interval_ms", self.sensors().update_interval_ms)?;

        Ok(())
    }
}

fn non_zero(field: &str, value: u64) -> Result<()> {
    if value == 0 {
        return Err(ConfigError::invalid(field, "must be greater than 0"));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Environment
// ─────────────────────────────────────────────────────────────────────────────

/// Deployment environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Dev,
    Uat,
    Prod,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Uat => "uat",
            Environment::Prod => "prod",
        }
    }

    pub fn is_production(&self) -> bool {
        *self == Environment::Prod
    }

    pub fn is_uat(&self) -> bool {
        *self == Environment::Uat
    }

    pub fn is_development(&self) -> bool {
        *self == Environment::Dev
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "uat" => Ok(Environment::Uat),
            "prod" => Ok(Environment::Prod),
            other => Err(ConfigError::invalid(
                "env",
                format!("'{other}' must be one of: dev, uat, prod"),
            )),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Server Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Server configuration.
///
/// ```toml
/// [server]
/// bind = "0.0.0.0"
/// port = 8080
/// max_connections = 10000
/// cors_origins = ["https://dashboard.example.com"]
/// static_path = "./frontend/static"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind: String,
    /// Port to listen on.
    pub port: u16,
    /// Admission capacity shared by all `/api` requests, streams included.
    pub max_connections: usize,
    /// Allowed CORS origins. `"*"` allows any origin.
    pub cors_origins: Vec<String>,
    /// Directory of static dashboard assets served at `/`.
    pub static_path: Option<PathBuf>,
    /// Enable request logging.
    pub request_logging: bool,
    /// Identifier stamped on every streamed event. Defaults to `$HOSTNAME`.
    pub server_id: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            cors_origins: vec!["*".to_string()],
            static_path: None,
            request_logging: true,
            server_id: None,
        }
    }
}

impl ServerConfig {
    /// The configured server id, else `$HOSTNAME`, else `"unknown"`.
    pub fn resolved_server_id(&self) -> String {
        self.server_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .or_else(|| std::env::var("HOSTNAME").ok().filter(|h| !h.is_empty()))
            .unwrap_or_else(|| "unknown".to_string())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rate Limit Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Per-client request rate limiting.
///
/// Unset values are derived from `server.max_connections`: the rate equals
/// it and the burst is one and a half times it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub requests_per_second: Option<u32>,
    pub burst: Option<u32>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_second: None,
            burst: None,
        }
    }
}

impl RateLimitConfig {
    /// `(requests_per_second, burst)` with derived defaults applied.
    pub fn effective(&self, max_connections: usize) -> (u32, u32) {
        let base = u32::try_from(max_connections).unwrap_or(u32::MAX).max(1);
        let rps = self.requests_per_second.unwrap_or(base);
        let burst = self
            .burst
            .unwrap_or_else(|| base.saturating_add(base / 2))
            .max(1);
        (rps, burst)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Security Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Security headers added to every response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// `X-XSS-Protection` value. Empty disables the header.
    pub xss_protection: String,
    /// `X-Content-Type-Options` value. Empty disables the header.
    pub content_type_nosniff: String,
    /// `X-Frame-Options`: `DENY`, `SAMEORIGIN` or `ALLOW-FROM`.
    pub x_frame_options: String,
    /// `Strict-Transport-Security` max-age in seconds. `0` disables the header.
    pub hsts_max_age: u64,
    /// `Content-Security-Policy` value. Empty disables the header.
    pub content_security_policy: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            xss_protection: "1; mode=block".to_string(),
            content_type_nosniff: "nosniff".to_string(),
            x_frame_options: "DENY".to_string(),
            hsts_max_age: 0,
            content_security_policy: "default-src 'self'".to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Stream Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Event stream cadence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Period between data refreshes pushed to each client.
    pub refresh_interval_ms: u64,
    /// Period between keepalive pings.
    pub keepalive_interval_ms: u64,
    /// Events buffered per connection before the client counts as gone.
    pub buffer: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 2_000,
            keepalive_interval_ms: 30_000,
            buffer: 16,
        }
    }
}

impl StreamConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_millis(self.keepalive_interval_ms)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cache Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Payload cache configuration.
///
/// ```toml
/// [cache]
/// ttl_secs = 30
/// sweep_interval_secs = 300
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 30,
            sweep_interval_secs: 300,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sensors Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Sensor simulator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorsConfig {
    pub update_interval_ms: u64,
}

impl Default for SensorsConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: 2_000,
        }
    }
}

impl SensorsConfig {
    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Logging configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Force JSON console output. Unset means JSON only in `prod`.
    pub json: Option<bool>,
    /// Directory for daily rolling JSON log files.
    pub file_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: None,
            file_dir: None,
        }
    }
}

impl LoggingConfig {
    /// Whether console output should be JSON in `env`.
    pub fn json_for(&self, env: Environment) -> bool {
        self.json.unwrap_or(env.is_production())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
