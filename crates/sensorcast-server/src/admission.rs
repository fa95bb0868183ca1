//! Admission control for concurrent requests.
//!
//! A fixed number of permits is shared by every admitted request. A permit
//! is held for the whole lifetime of the response body, so a long-lived
//! event stream keeps its slot until the client goes away.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures::Stream;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Body of the `503` sent when no permit is available.
pub const CAPACITY_MESSAGE: &str = "Server is at maximum capacity. Please try again later.";

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// Non-blocking counting gate.
///
/// Acquisition either succeeds immediately or fails; it never waits.
#[derive(Debug, Clone)]
pub struct AdmissionLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl AdmissionLimiter {
    /// Create a limiter admitting at most `capacity` units at once.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.min(Semaphore::MAX_PERMITS);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Units currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Units currently held.
    pub fn outstanding(&self) -> usize {
        self.capacity - self.available()
    }

    /// Take one unit, or `None` if the limiter is full.
    pub fn try_acquire(&self) -> Option<AdmissionPermit> {
        self.try_acquire_weighted(1)
    }

    /// Take `weight` units at once, or `None` if fewer are free.
    ///
    /// A weight of zero is rejected: every permit holds at least one unit.
    pub fn try_acquire_weighted(&self, weight: u32) -> Option<AdmissionPermit> {
        if weight == 0 {
            return None;
        }
        Arc::clone(&self.semaphore)
            .try_acquire_many_owned(weight)
            .ok()
            .map(|permit| AdmissionPermit { permit })
    }
}

/// Held admission units. Returned to the limiter when released or dropped.
#[derive(Debug)]
#[must_use = "the permit is released as soon as it is dropped"]
pub struct AdmissionPermit {
    permit: OwnedSemaphorePermit,
}

impl AdmissionPermit {
    /// Units held by this permit.
    pub fn weight(&self) -> usize {
        self.permit.num_permits()
    }

    /// Give the units back.
    pub fn release(self) {
        drop(self);
    }
}

/// Response body that owns an admission permit.
///
/// The permit is released when the inner body ends or this value is dropped,
/// whichever happens first.
struct Admitted<S> {
    inner: S,
    permit: Option<AdmissionPermit>,
}

impl<S> Stream for Admitted<S>
where
    S: Stream + Unpin,
{
    type Item = S::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        let item = Pin::new(&mut this.inner).poll_next(cx);
        if let Poll::Ready(None) = item {
            this.permit.take();
        }
        item
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Middleware
// ─────────────────────────────────────────────────────────────────────────────

/// Admit a request only if a permit is free.
///
/// Rejected requests get `503` and never reach the handler. Admitted
/// responses carry the permit in their body.
pub async fn admission_middleware(
    State(limiter): State<AdmissionLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let Some(permit) = limiter.try_acquire() else {
        tracing::warn!(
            path = %request.uri().path(),
            capacity = limiter.capacity(),
            "Admission rejected, server at capacity"
        );
        return (StatusCode::SERVICE_UNAVAILABLE, CAPACITY_MESSAGE).into_response();
    };

    let response = next.run(request).await;
    let (parts, body) = response.into_parts();
    let body = Body::from_stream(Admitted {
        inner: body.into_data_stream(),
        permit: Some(permit),
    });

    Response::from_parts(parts, body)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
