//! Application state shared across handlers.

use std::sync::Arc;

use sensorcast_sensors::SensorService;
use tokio_util::sync::CancellationToken;

use crate::admission::AdmissionLimiter;
use crate::config::ServerConfig;
use crate::ratelimit::{SharedRateLimiter, create_rate_limiter};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,

    /// Cache-fronted sensor lookups.
    pub sensors: Arc<dyn SensorService>,

    /// Gate for concurrently admitted `/api` requests.
    pub admission: AdmissionLimiter,

    /// Per-client request rate limiter.
    pub rate_limiter: SharedRateLimiter,

    /// Cancelled on shutdown. Every streaming session runs on a child token.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Create a new application state.
    pub fn new(sensors: Arc<dyn SensorService>, config: ServerConfig) -> Self {
        let admission = AdmissionLimiter::new(config.max_connections);
        let rate_limiter = create_rate_limiter(config.requests_per_second, config.burst);
        Self {
            config: Arc::new(config),
            sensors,
            admission,
            rate_limiter,
            shutdown: CancellationToken::new(),
        }
    }

    /// Use `token` as the process-wide shutdown signal.
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }
}
