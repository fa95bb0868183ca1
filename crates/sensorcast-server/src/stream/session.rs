//! Per-connection streaming session.
//!
//! A session moves through three states:
//!
//! - `Connecting`: parse `Last-Event-ID`, fetch the first snapshot, queue
//!   the initial `message` event. A fetch failure aborts the connection.
//! - `Streaming`: one loop reacting to the disconnect notification, the
//!   refresh timer and the keepalive timer.
//! - `Closed`: terminal. Reached once, when the client goes away, the server
//!   shuts down, or an event cannot be handed to the transport.
//!
//! Events flow through a bounded channel into an [`EventStream`], which
//! feeds the `Sse` response body. Dropping the body cancels the session.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::response::sse::Event;
use futures::Stream;
use sensorcast_sensors::{SensorError, SensorService};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info, warn};

use super::frame::{EventFrame, json_string};

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Streaming,
    Closed,
}

/// Event stream cadence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSettings {
    /// Period between data refreshes.
    pub refresh_interval: Duration,
    /// Period between keepalive pings.
    pub keepalive_interval: Duration,
    /// Events buffered for a slow client before it counts as gone.
    pub buffer: usize,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(2),
            keepalive_interval: Duration::from_secs(30),
            buffer: 16,
        }
    }
}

impl StreamSettings {
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn with_keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }

    pub fn with_buffer(mut self, buffer: usize) -> Self {
        self.buffer = buffer;
        self
    }
}

/// Transport-level facts about an incoming stream request.
#[derive(Debug, Clone)]
pub struct ConnectRequest {
    /// Client address, for logs only.
    pub connection_id: String,
    /// Raw `Last-Event-ID` header value, if any.
    pub last_event_id: Option<String>,
    /// Identifier stamped on every event.
    pub server_id: String,
}

/// Counters reported when a session closes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionReport {
    pub connection_id: String,
    /// `message` events handed to the transport, the initial one included.
    pub data_events: u64,
    pub pings: u64,
    /// Refresh ticks skipped because the snapshot could not be fetched.
    pub skipped_refreshes: u64,
}

/// Response body side of a session.
///
/// Dropping it cancels the session, which is how a client disconnect
/// reaches the streaming loop.
pub struct EventStream {
    rx: mpsc::Receiver<Event>,
    _guard: DropGuard,
}

impl Stream for EventStream {
    type Item = Result<Event, Infallible>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx).map(|frame| frame.map(Ok))
    }
}

/// One client's event stream.
pub struct StreamingSession {
    connection_id: String,
    last_event_id: Option<i64>,
    server_id: String,
    state: SessionState,
    service: Arc<dyn SensorService>,
    settings: StreamSettings,
    outbox: mpsc::Sender<Event>,
    token: CancellationToken,
    last_id: i64,
    report: SessionReport,
}

// ─────────────────────────────────────────────────────────────────────────────
// Session
// ─────────────────────────────────────────────────────────────────────────────

impl StreamingSession {
    /// Run the `Connecting` phase.
    ///
    /// On success the initial event is already queued on the returned
    /// [`EventStream`] and the session is ready for [`run`](Self::run).
    /// `token` should be a child of the server's shutdown token.
    pub async fn connect(
        service: Arc<dyn SensorService>,
        request: ConnectRequest,
        settings: StreamSettings,
        token: CancellationToken,
    ) -> Result<(Self, EventStream), SensorError> {
        let (outbox, rx) = mpsc::channel(settings.buffer.max(1));
        let stream = EventStream {
            rx,
            _guard: token.clone().drop_guard(),
        };

        let ConnectRequest {
            connection_id,
            last_event_id,
            server_id,
        } = request;

        let mut session = Self {
            last_event_id: parse_last_event_id(&connection_id, last_event_id.as_deref()),
            connection_id: connection_id.clone(),
            server_id: json_string(&server_id),
            state: SessionState::Connecting,
            service,
            settings,
            outbox,
            token,
            last_id: 0,
            report: SessionReport {
                connection_id,
                ..Default::default()
            },
        };

        info!(connection_id = %session.connection_id, "Client connected to event stream");

        let snapshot = session.service.get_all_snapshot().await.inspect_err(|e| {
            error!(
                connection_id = %session.connection_id,
                error = %e,
                "Failed to get initial sensor data"
            );
        })?;

        let frame = EventFrame::message(session.next_id(), &session.server_id, &snapshot);
        session.emit(frame);
        session.report.data_events += 1;
        session.state = SessionState::Streaming;

        Ok((session, stream))
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    /// Parsed `Last-Event-ID`. Logged on connect, otherwise unused.
    pub fn last_event_id(&self) -> Option<i64> {
        self.last_event_id
    }

    /// Run the `Streaming` phase until the session closes.
    pub async fn run(mut self) -> SessionReport {
        let (notify, mut disconnected) = oneshot::channel::<()>();
        let watched = self.token.clone();
        let watcher = tokio::spawn(async move {
            watched.cancelled().await;
            let _ = notify.send(());
        });

        let start = Instant::now();
        let refresh_period = self.settings.refresh_interval.max(Duration::from_millis(1));
        let keepalive_period = self.settings.keepalive_interval.max(Duration::from_millis(1));
        let mut refresh = tokio::time::interval_at(start + refresh_period, refresh_period);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut keepalive = tokio::time::interval_at(start + keepalive_period, keepalive_period);
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                _ = &mut disconnected => {
                    info!(connection_id = %self.connection_id, "Client disconnected from event stream");
                    break;
                }
                _ = refresh.tick() => {
                    match self.service.get_all_snapshot().await {
                        Ok(snapshot) => {
                            let frame = EventFrame::message(self.next_id(), &self.server_id, &snapshot);
                            if !self.emit(frame) {
                                break;
                            }
                            self.report.data_events += 1;
                        }
                        Err(e) => {
                            warn!(
                                connection_id = %self.connection_id,
                                error = %e,
                                "Failed to get sensor data for stream update"
                            );
                            self.report.skipped_refreshes += 1;
                        }
                    }
                }
                _ = keepalive.tick() => {
                    let frame = EventFrame::ping(self.next_id(), &self.server_id);
                    if !self.emit(frame) {
                        break;
                    }
                    self.report.pings += 1;
                }
            }
        }

        self.state = SessionState::Closed;
        self.token.cancel();
        let _ = watcher.await;

        info!(
            connection_id = %self.report.connection_id,
            data_events = self.report.data_events,
            pings = self.report.pings,
            skipped_refreshes = self.report.skipped_refreshes,
            "Event stream closed"
        );

        self.report
    }

    /// Current unix seconds, never lower than the last id handed out.
    fn next_id(&mut self) -> i64 {
        self.last_id = self.last_id.max(chrono::Utc::now().timestamp());
        self.last_id
    }

    /// Queue a frame for the transport. `false` means the client is gone.
    fn emit(&mut self, frame: EventFrame) -> bool {
        match self.outbox.try_send(frame.into_event()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(
                    connection_id = %self.connection_id,
                    buffer = self.settings.buffer,
                    "Client not keeping up, closing event stream"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(connection_id = %self.connection_id, "Event stream receiver gone");
                false
            }
        }
    }
}

/// Parse a `Last-Event-ID` header. Invalid values are logged and ignored.
fn parse_last_event_id(connection_id: &str, raw: Option<&str>) -> Option<i64> {
    let raw = raw.filter(|v| !v.is_empty())?;
    match raw.parse::<i64>() {
        Ok(id) => {
            info!(connection_id = %connection_id, last_event_id = id, "Reconnection with Last-Event-ID");
            Some(id)
        }
        Err(e) => {
            warn!(
                connection_id = %connection_id,
                last_event_id = %raw,
                error = %e,
                "Invalid Last-Event-ID received"
            );
            None
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
