//! HTTP API and Server-Sent Events server for Sensorcast.
//!
//! # Features
//!
//! - REST snapshot of every sensor and per-sensor lookup
//! - Live sensor updates over Server-Sent Events with keepalive pings
//! - Admission control capping concurrently served `/api` requests
//! - Per-client rate limiting, security headers and CORS
//! - JSON error bodies for unmatched routes
//! - Request logging
//!
//! # Example
//!
//! ```ignore
//! use sensorcast_server::{AppState, Server, ServerConfig};
//!
//! let config = ServerConfig::new().with_bind_address("127.0.0.1:8080".parse()?);
//! let state = AppState::new(Arc::new(service), config).with_shutdown(token);
//!
//! Server::from_state(state).run().await?;
//! ```

pub mod admission;
pub mod client;
pub mod config;
pub mod error;
pub mod ratelimit;
pub mod routes;
pub mod security;
pub mod state;
pub mod stream;

#[cfg(test)]
mod test_support;

pub use admission::{AdmissionLimiter, AdmissionPermit, CAPACITY_MESSAGE, admission_middleware};
pub use config::ServerConfig;
pub use error::{ErrorResponse, Result, ServerError, status_and_code};
pub use ratelimit::{rate_limit_middleware, request_logging_middleware};
pub use state::AppState;
pub use stream::{SessionReport, StreamSettings, StreamingSession};

use std::net::SocketAddr;
use std::time::Duration;

use axum::{Router, middleware};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Period between removals of idle rate limit keys.
const RATE_LIMIT_PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// The Sensorcast HTTP server.
pub struct Server {
    /// Application state.
    state: AppState,
}

impl Server {
    /// Create a server from a pre-built application state.
    pub fn from_state(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        let config = &self.state.config;

        let mut router = Router::new()
            // Health stays reachable when the server is at capacity
            .merge(routes::health_routes())
            .nest("/api", self.api_routes());

        router = match &config.static_path {
            Some(path) => router.fallback_service(ServeDir::new(path)),
            None => router.fallback(routes::not_found_handler),
        };

        let mut router = router
            // Request logging (inner layer, runs first)
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                ratelimit::request_logging_middleware,
            ))
            // Rate limiting (outer layer, runs before request logging)
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                ratelimit::rate_limit_middleware,
            ))
            .layer(TraceLayer::new_for_http());

        for layer in security::security_header_layers(&config.security) {
            router = router.layer(layer);
        }

        router
            .layer(security::cors_layer(&config.cors_origins))
            .with_state(self.state.clone())
    }

    /// API routes, all behind admission control.
    fn api_routes(&self) -> Router<AppState> {
        use axum::routing::get;

        Router::new()
            .route("/sensors", get(routes::list_sensors_handler))
            .route("/sensors/", get(routes::missing_sensor_id_handler))
            .route("/sensors/stream", get(routes::stream_handler))
            .route("/sensors/{id}", get(routes::get_sensor_handler))
            .route("/environment", get(routes::environment_handler))
            .layer(middleware::from_fn_with_state(
                self.state.admission.clone(),
                admission::admission_middleware,
            ))
            // Added after the admission layer, so unmatched paths take no permit
            .fallback(routes::not_found_handler)
    }

    /// Run the server on the configured bind address.
    pub async fn run(self) -> Result<()> {
        let addr = self.state.config.bind_address;
        self.run_on(addr).await
    }

    /// Run the server on a specific address (useful for testing).
    pub async fn run_on(self, addr: SocketAddr) -> Result<()> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to bind {addr}: {e}")))?;

        self.serve(listener).await
    }

    /// Serve on an already bound listener until the shutdown token is cancelled.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let router = self.router();
        let shutdown = self.state.shutdown.clone();

        if let Ok(addr) = listener.local_addr() {
            info!(
                addr = %addr,
                env = %self.state.config.env,
                max_connections = self.state.admission.capacity(),
                "Starting server"
            );
        }

        let pruner_token = shutdown.child_token();
        let pruner = self.state.config.rate_limiting.then(|| {
            ratelimit::spawn_pruner(
                self.state.rate_limiter.clone(),
                RATE_LIMIT_PRUNE_INTERVAL,
                pruner_token.clone(),
            )
        });

        let result = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await;

        pruner_token.cancel();
        if let Some(pruner) = pruner {
            let _ = pruner.await;
        }
        result.map_err(|e| ServerError::Internal(format!("Server error: {e}")))?;

        info!("Server stopped");
        Ok(())
    }
}
