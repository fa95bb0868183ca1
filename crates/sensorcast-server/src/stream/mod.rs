//! Server-Sent Events streaming.

mod frame;
mod session;

pub use frame::{EventFrame, EventKind, json_string};
pub use session::{
    ConnectRequest, EventStream, SessionReport, SessionState, StreamSettings, StreamingSession,
};
