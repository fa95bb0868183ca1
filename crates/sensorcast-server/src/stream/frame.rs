//! Server-Sent Events payloads.
//!
//! ```text
//! id: <unix-seconds>\nevent: message\ndata: {"server_id":"<id>","data":<json>}\n\n
//! id: <unix-seconds>\nevent: ping\ndata: {"ping": true, "server_id": "<id>"}\n\n
//! ```

use axum::response::sse::Event;

/// Event type carried in the `event:` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Message,
    Ping,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Message => "message",
            EventKind::Ping => "ping",
        }
    }
}

/// One event before it is handed to the SSE body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFrame {
    pub id: i64,
    pub kind: EventKind,
    pub data: String,
}

impl EventFrame {
    /// A data event wrapping an already-serialized JSON payload.
    ///
    /// `server_id` must be a JSON string literal, quotes included
    /// (see [`json_string`]).
    pub fn message(id: i64, server_id: &str, payload: &[u8]) -> Self {
        let payload = String::from_utf8_lossy(payload);
        Self {
            id,
            kind: EventKind::Message,
            data: format!(r#"{{"server_id":{server_id},"data":{payload}}}"#),
        }
    }

    /// A keepalive event. `server_id` as for [`EventFrame::message`].
    pub fn ping(id: i64, server_id: &str) -> Self {
        Self {
            id,
            kind: EventKind::Ping,
            data: format!(r#"{{"ping": true, "server_id": {server_id}}}"#),
        }
    }

    /// Convert into an axum SSE event with `id`, `event` and `data` fields.
    pub fn into_event(self) -> Event {
        Event::default()
            .id(self.id.to_string())
            .event(self.kind.as_str())
            .data(self.data)
    }
}

/// Quote and escape `s` as a JSON string literal.
pub fn json_string(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}
