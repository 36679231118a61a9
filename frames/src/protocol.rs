//! Room protocol: event names and the typed payloads carried in `Frame::data`.
//!
//! Keys are camelCase on the wire (`roomId`, `userColor`, `objectId`) so
//! browser clients can speak the protocol without a translation layer.
//!
//! Every inbound payload is validated with `validate()` after decoding; the
//! gateway drops anything that fails instead of replying with an error.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Frame;

// =============================================================================
// EVENT NAMES
// =============================================================================

/// S→C: sent once after upgrade, carries the server-assigned connection id.
pub const SESSION_CONNECTED: &str = "session-connected";
/// C→S: join a room.
pub const JOIN_CANVAS: &str = "join-canvas";
/// C→S: pointer position report.
pub const MOUSE_MOVE: &str = "mouse-move";
/// S→C: a peer's pointer moved.
pub const USER_MOUSE_MOVE: &str = "user-mouse-move";
/// C→S and S→C: object mutation.
pub const CANVAS_UPDATE: &str = "canvas-update";
/// S→C: roster reply to a join.
pub const ACTIVE_USERS: &str = "active-users";
/// S→C: a participant joined the room.
pub const USER_JOINED: &str = "user-joined";
/// S→C: a participant left the room.
pub const USER_LEFT: &str = "user-left";

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("invalid {event} payload: {source}")]
    InvalidPayload {
        event: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
}

// =============================================================================
// SHARED TYPES
// =============================================================================

/// A position in canvas world coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One connected user's presence within a room.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(rename = "connectionId")]
    pub connection_id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "username")]
    pub display_name: String,
    #[serde(rename = "userColor")]
    pub color: String,
    #[serde(rename = "mousePosition", default)]
    pub pointer: Point,
    #[serde(rename = "activeObjectId", default, skip_serializing_if = "Option::is_none")]
    pub active_object_id: Option<String>,
}

/// Kind of object mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Add,
    Modify,
    /// Older clients send `remove` for deletions.
    #[serde(alias = "remove")]
    Delete,
}

impl Operation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Modify => "modify",
            Self::Delete => "delete",
        }
    }

    /// Whether this operation must carry an object snapshot.
    #[must_use]
    pub fn carries_snapshot(self) -> bool {
        !matches!(self, Self::Delete)
    }
}

// =============================================================================
// PAYLOADS
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConnected {
    pub connection_id: String,
    pub user_id: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinCanvas {
    pub room_id: String,
    pub user_id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_color: Option<String>,
}

impl JoinCanvas {
    /// # Errors
    ///
    /// Returns `MissingField` when the room, user, or display name is blank.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        require("roomId", &self.room_id)?;
        require("userId", &self.user_id)?;
        require("username", &self.username)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MouseMove {
    pub room_id: String,
    pub position: Point,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMouseMove {
    pub connection_id: String,
    pub position: Point,
}

/// Object mutation. `sender_id` and `user_id` are stamped by the server on
/// relay; whatever a client puts there is overwritten.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasUpdate {
    pub room_id: String,
    pub operation: Operation,
    pub object_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl CanvasUpdate {
    #[must_use]
    pub fn new(room_id: impl Into<String>, operation: Operation, object_id: impl Into<String>, object: Option<Value>) -> Self {
        Self {
            room_id: room_id.into(),
            operation,
            object_id: object_id.into(),
            object,
            sender_id: None,
            user_id: None,
        }
    }

    /// # Errors
    ///
    /// Returns `MissingField` when the object id is blank or an add/modify
    /// arrives without a snapshot.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        require("roomId", &self.room_id)?;
        require("objectId", &self.object_id)?;
        if self.operation.carries_snapshot() && self.object.as_ref().is_none_or(Value::is_null) {
            return Err(ProtocolError::MissingField("object"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActiveUsers {
    pub users: Vec<Participant>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLeft {
    pub connection_id: String,
}

// =============================================================================
// DECODING
// =============================================================================

/// Decode a frame's payload into a typed protocol message.
///
/// # Errors
///
/// Returns `InvalidPayload` when the payload does not match `T`.
pub fn decode_payload<T: DeserializeOwned>(frame: &Frame) -> Result<T, ProtocolError> {
    serde_json::from_value(frame.data.clone()).map_err(|source| ProtocolError::InvalidPayload {
        event: frame.syscall.clone(),
        source,
    })
}

fn require(field: &'static str, value: &str) -> Result<(), ProtocolError> {
    if value.trim().is_empty() {
        return Err(ProtocolError::MissingField(field));
    }
    Ok(())
}

#[cfg(test)]
#[path = "protocol_test.rs"]
mod tests;
