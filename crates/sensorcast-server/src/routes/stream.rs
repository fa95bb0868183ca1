//! Server-Sent Events endpoint.

use axum::{
    extract::{Request, State},
    http::header,
    response::{IntoResponse, Response, sse::Sse},
};

use crate::client::client_address;
use crate::error::{Result, ServerError};
use crate::state::AppState;
use crate::stream::{ConnectRequest, StreamingSession};

/// Header a reconnecting client uses to report the last event it saw.
const LAST_EVENT_ID: &str = "last-event-id";

/// GET /api/sensors/stream
///
/// Headers go out as soon as the initial snapshot is queued. The session then
/// runs on its own task until the client disconnects or the server stops.
/// Keepalive is the session's own `ping` event, so no `KeepAlive` is attached.
pub async fn stream_handler(State(state): State<AppState>, request: Request) -> Result<Response> {
    let connect = ConnectRequest {
        connection_id: client_address(&request),
        last_event_id: request
            .headers()
            .get(LAST_EVENT_ID)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        server_id: state.config.server_id.clone(),
    };

    let (session, events) = StreamingSession::connect(
        state.sensors.clone(),
        connect,
        state.config.stream.clone(),
        state.shutdown.child_token(),
    )
    .await
    .map_err(|e| ServerError::sensor("failed to get initial sensor data", e))?;

    tokio::spawn(session.run());

    Ok(([(header::CONNECTION, "keep-alive")], Sse::new(events)).into_response())
}
