//! Rate limiting and request logging middleware.
//!
//! Each client gets its own quota, keyed by the address from
//! [`client_address`]. Keys are pruned periodically once their quota has
//! fully refilled.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json,
    body::Body,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::client::client_address;
use crate::error::ErrorResponse;
use crate::state::AppState;

/// Code carried by the `429` body.
pub const RATE_LIMITED_CODE: &str = "HTTP_ERROR";

/// Message carried by the `429` body.
pub const RATE_LIMITED_MESSAGE: &str = "Too many requests";

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// Per-client rate limiter keyed by client address.
pub type SharedRateLimiter = Arc<DefaultKeyedRateLimiter<String>>;

// ─────────────────────────────────────────────────────────────────────────────
// Rate Limiter Factory
// ─────────────────────────────────────────────────────────────────────────────

/// Create a rate limiter allowing each client `requests_per_second` with
/// bursts up to `burst`.
///
/// Zero values are raised to one.
pub fn create_rate_limiter(requests_per_second: u32, burst: u32) -> SharedRateLimiter {
    let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
    let burst = NonZeroU32::new(burst).unwrap_or(rate);
    let quota = Quota::per_second(rate).allow_burst(burst);
    Arc::new(RateLimiter::keyed(quota))
}

/// Drop idle client keys every `period` until `token` is cancelled.
pub fn spawn_pruner(
    limiter: SharedRateLimiter,
    period: Duration,
    token: CancellationToken,
) -> JoinHandle<()> {
    let period = period.max(Duration::from_millis(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    let before = limiter.len();
                    limiter.retain_recent();
                    limiter.shrink_to_fit();
                    let pruned = before.saturating_sub(limiter.len());
                    if pruned > 0 {
                        tracing::debug!(pruned, remaining = limiter.len(), "Pruned idle rate limit keys");
                    }
                }
            }
        }
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Middleware
// ─────────────────────────────────────────────────────────────────────────────

/// Reject requests beyond the client's quota with `429`.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.config.rate_limiting {
        return next.run(request).await;
    }

    let client = client_address(&request);
    match state.rate_limiter.check_key(&client) {
        Ok(_) => next.run(request).await,
        Err(_not_until) => {
            // The quota refills every second, so one second is always enough.
            let retry_after = 1u64;

            tracing::warn!(
                client = %client,
                path = %request.uri().path(),
                retry_after_seconds = retry_after,
                "Rate limit exceeded"
            );

            let body = ErrorResponse {
                code: RATE_LIMITED_CODE.to_string(),
                message: RATE_LIMITED_MESSAGE.to_string(),
            };

            (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, retry_after.to_string())],
                Json(body),
            )
                .into_response()
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Request Logging
// ─────────────────────────────────────────────────────────────────────────────

/// Structured request logging middleware.
///
/// Logs method, path, status and time to response headers. For an event
/// stream that is the time to connect, not the stream's lifetime.
pub async fn request_logging_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.config.request_logging {
        return next.run(request).await;
    }

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = std::time::Instant::now();

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "Request completed with server error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "Request completed with client error"
        );
    } else {
        tracing::info!(
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "Request completed"
        );
    }

    response
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
