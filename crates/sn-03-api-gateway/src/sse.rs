//! Server-sent-event frames of the live stream.

use serde::Serialize;
use tracing::error;

pub const PING_FRAME: &str = "event: ping\ndata: {}\n\n";

pub const CLOSE_FRAME: &str = "event: close\ndata: {\"reason\":\"unsubscribed\"}\n\n";

/// Sent in place of an event whose payload failed to serialize.
pub const MARSHAL_ERROR_FRAME: &str =
    "event: error\ndata: {\"error\":\"failed to marshal payload\"}\n\n";

/// `new_notifications` frame carrying `payload` as JSON.
pub fn event_frame<T: Serialize>(payload: &T) -> String {
    match serde_json::to_string(payload) {
        Ok(json) => format!("event: new_notifications\ndata: {json}\n\n"),
        Err(err) => {
            error!(error = %err, "Failed to serialize live payload");
            MARSHAL_ERROR_FRAME.to_string()
        }
    }
}
