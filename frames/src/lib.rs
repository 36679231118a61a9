//! Realtime frame envelope and its binary codec.
//!
//! This crate owns the wire representation used by both the `sketchroom`
//! server and the `canvas` client core. Frame payloads stay flexible
//! (`serde_json::Value`) while encoding over protobuf for compact binary
//! transport. The typed room protocol carried inside those payloads lives in
//! [`protocol`]; the durable document snapshot exchanged over HTTP lives in
//! [`document`].

pub mod document;
pub mod protocol;
mod wire;

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use document::ProjectDocument;
pub use protocol::{
    ActiveUsers, CanvasUpdate, JoinCanvas, MouseMove, Operation, Participant, Point, ProtocolError,
    SessionConnected, UserLeft, UserMouseMove,
};

/// Error returned by [`decode_frame`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The raw bytes are not a protobuf frame.
    #[error("failed to decode protobuf frame: {0}")]
    Decode(#[from] prost::DecodeError),
    /// The `status` integer on the wire does not map to a known [`Status`] variant.
    #[error("invalid frame status: {0}")]
    InvalidStatus(i32),
}

/// Lifecycle status of a frame.
///
/// Room events are fire-and-forget `Request` frames; the only reply the
/// server ever sends is the `active-users` roster answering a join, which is
/// marked `Done` and carries the join frame's id as `parent_id`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Event or request frame.
    Request,
    /// Terminal reply to a request.
    Done,
}

/// A single message on the realtime wire protocol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Unique identifier for this frame (UUID string).
    pub id: String,
    /// ID of the request frame this is responding to, if any.
    pub parent_id: Option<String>,
    /// Milliseconds since the Unix epoch when the frame was created.
    pub ts: i64,
    /// Room (project) context for this frame, if any.
    pub room_id: Option<String>,
    /// Sender identifier, stamped by the server on relayed frames.
    pub from: Option<String>,
    /// Event name, e.g. `"canvas-update"`.
    pub syscall: String,
    /// Lifecycle position of the frame.
    pub status: Status,
    /// Arbitrary JSON payload.
    pub data: Value,
}

/// Current time as milliseconds since Unix epoch.
#[must_use]
pub fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

impl Frame {
    /// Create a request frame with a fresh id and timestamp.
    pub fn request(syscall: impl Into<String>, data: Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            parent_id: None,
            ts: now_ms(),
            room_id: None,
            from: None,
            syscall: syscall.into(),
            status: Status::Request,
            data,
        }
    }

    /// Create a request frame whose payload is a serialized protocol message.
    ///
    /// Protocol payloads are plain structs with string keys, so serialization
    /// cannot fail in practice; a failure degrades to an empty object.
    pub fn event(syscall: impl Into<String>, payload: &impl Serialize) -> Self {
        let data = serde_json::to_value(payload).unwrap_or_else(|_| Value::Object(Map::new()));
        Self::request(syscall, data)
    }

    /// Build a `Done` reply correlated to this frame.
    #[must_use]
    pub fn reply(&self, syscall: impl Into<String>, payload: &impl Serialize) -> Self {
        let mut frame = Self::event(syscall, payload);
        frame.parent_id = Some(self.id.clone());
        frame.room_id.clone_from(&self.room_id);
        frame.status = Status::Done;
        frame
    }

    #[must_use]
    pub fn with_room_id(mut self, room_id: impl Into<String>) -> Self {
        self.room_id = Some(room_id.into());
        self
    }

    #[must_use]
    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }
}

/// Encode a frame into protobuf bytes.
#[must_use]
pub fn encode_frame(frame: &Frame) -> Vec<u8> {
    wire::encode(frame)
}

/// Decode protobuf bytes into a frame.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] for malformed bytes and
/// [`CodecError::InvalidStatus`] for out-of-range status values.
pub fn decode_frame(bytes: &[u8]) -> Result<Frame, CodecError> {
    wire::decode(bytes)
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
