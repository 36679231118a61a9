//! Transport glue between websocket messages and `frames::Frame`.
//!
//! ARCHITECTURE
//! ============
//! Clients normally send protobuf-encoded binary messages. JSON text
//! messages carrying the same `Frame` shape are accepted too, which keeps the
//! protocol usable from a browser console. Outbound frames are always binary.

use axum::extract::ws::Message;
use frames::{CodecError, Frame};

/// Stable, grepable error code for logs and HTTP bodies.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;
}

#[derive(Debug, thiserror::Error)]
pub enum InboundError {
    #[error("binary frame: {0}")]
    Codec(#[from] CodecError),
    #[error("text frame: {0}")]
    Json(#[from] serde_json::Error),
}

impl ErrorCode for InboundError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Codec(_) => "E_FRAME_DECODE",
            Self::Json(_) => "E_FRAME_JSON",
        }
    }
}

impl ErrorCode for frames::ProtocolError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidPayload { .. } => "E_INVALID_PAYLOAD",
            Self::MissingField(_) => "E_MISSING_FIELD",
        }
    }
}

/// Decode one websocket message. Control messages yield `Ok(None)`.
///
/// # Errors
///
/// Returns an error when a data message does not hold a frame.
pub fn parse_inbound(message: &Message) -> Result<Option<Frame>, InboundError> {
    match message {
        Message::Binary(bytes) => Ok(Some(frames::decode_frame(bytes)?)),
        Message::Text(text) => Ok(Some(serde_json::from_str(text.as_str())?)),
        Message::Ping(_) | Message::Pong(_) | Message::Close(_) => Ok(None),
    }
}

#[must_use]
pub fn encode_outbound(frame: &Frame) -> Message {
    Message::Binary(frames::encode_frame(frame).into())
}

#[cfg(test)]
#[path = "frame_test.rs"]
mod tests;
