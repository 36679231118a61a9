//! WebSocket gateway: room membership and event relay.
//!
//! DESIGN
//! ======
//! On upgrade, assigns a connection id and enters a `select!` loop:
//! - Incoming client frames → decode + dispatch by event name
//! - Frames routed from room peers → forward to client
//!
//! Handlers validate, update presence, and return an `Outcome`. The dispatch
//! layer owns all outbound concerns: reply to sender and relay to peers.
//! The server never stores object state; it stamps sender identity onto
//! `canvas-update` and relays it unchanged otherwise.
//!
//! ERROR HANDLING
//! ==============
//! Malformed or out-of-order frames are logged and dropped. The connection
//! stays open and the sender gets no reply.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade (token checked first) → send `session-connected`
//! 2. `join-canvas` → reply `active-users`, peers get `user-joined`
//! 3. `mouse-move` / `canvas-update` → relayed to peers
//! 4. Close or transport error → leave room → peers get one `user-left`

use std::collections::HashMap;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use frames::protocol::{
    self, ACTIVE_USERS, CANVAS_UPDATE, JOIN_CANVAS, MOUSE_MOVE, SESSION_CONNECTED, USER_JOINED, USER_LEFT,
    USER_MOUSE_MOVE,
};
use frames::{
    ActiveUsers, CanvasUpdate, Frame, JoinCanvas, MouseMove, Operation, ProtocolError, SessionConnected, UserLeft,
    UserMouseMove,
};
use rand::Rng;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::frame::{ErrorCode, encode_outbound, parse_inbound};
use crate::routes::auth;
use crate::services::identity::Identity;
use crate::services::presence::ParticipantInfo;
use crate::state::AppState;

// =============================================================================
// OUTCOME
// =============================================================================

/// Result returned by handler functions. The dispatch layer uses this to
/// decide who receives what; handlers never send frames directly.
#[derive(Debug)]
enum Outcome {
    /// Relay to the sender's room, excluding the sender.
    BroadcastExcludeSender(Frame),
    /// Answer the sender and tell the rest of the room.
    ReplyAndBroadcast { reply: Frame, broadcast: Frame },
    /// Accepted, nothing to send (e.g. a throttled pointer update).
    Nothing,
}

#[derive(Debug, thiserror::Error)]
enum GatewayError {
    #[error(transparent)]
    Malformed(#[from] ProtocolError),
    #[error("`{0}` before joining a room")]
    NotJoined(&'static str),
    #[error("frame names room `{named}` but connection is in `{joined}`")]
    WrongRoom { joined: String, named: String },
    #[error("unknown event `{0}`")]
    UnknownEvent(String),
}

impl ErrorCode for GatewayError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Malformed(e) => e.error_code(),
            Self::NotJoined(_) => "E_NOT_JOINED",
            Self::WrongRoom { .. } => "E_WRONG_ROOM",
            Self::UnknownEvent(_) => "E_UNKNOWN_EVENT",
        }
    }
}

/// Per-connection state owned by the connection's loop.
struct Connection {
    id: Uuid,
    identity: Identity,
    room: Option<String>,
    tx: mpsc::Sender<Frame>,
}

impl Connection {
    fn joined_room(&self, event: &'static str) -> Result<&str, GatewayError> {
        self.room.as_deref().ok_or(GatewayError::NotJoined(event))
    }
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    ws: WebSocketUpgrade,
) -> Response {
    let Some(token) = params.get("token").filter(|t| !t.is_empty()) else {
        return (StatusCode::UNAUTHORIZED, "token required").into_response();
    };

    let identity = match auth::resolve_token(&state, token).await {
        Ok(identity) => identity,
        Err(status) if status == StatusCode::UNAUTHORIZED => {
            return (status, "invalid or expired token").into_response();
        }
        Err(status) => return (status, "token validation error").into_response(),
    };

    ws.on_upgrade(move |socket| run_ws(socket, state, identity))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState, identity: Identity) {
    // Channel for frames routed to this client by room peers.
    let (client_tx, mut client_rx) = mpsc::channel::<Frame>(state.config.client_channel_capacity);
    let mut conn = Connection { id: Uuid::new_v4(), identity, room: None, tx: client_tx };

    let welcome = Frame::event(
        SESSION_CONNECTED,
        &SessionConnected { connection_id: conn.id.to_string(), user_id: conn.identity.user_id.clone() },
    );
    if socket.send(encode_outbound(&welcome)).await.is_err() {
        return;
    }

    let rooms = state.presence.room_count().await;
    info!(connection_id = %conn.id, user_id = %conn.identity.user_id, rooms, "ws: client connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                if matches!(msg, Message::Close(_)) {
                    break;
                }
                let frame = match parse_inbound(&msg) {
                    Ok(Some(frame)) => frame,
                    Ok(None) => continue,
                    Err(e) => {
                        warn!(connection_id = %conn.id, code = e.error_code(), error = %e, "ws: undecodable message");
                        continue;
                    }
                };
                if !send_all(&mut socket, process_inbound(&state, &mut conn, frame).await).await {
                    break;
                }
            }
            Some(frame) = client_rx.recv() => {
                if socket.send(encode_outbound(&frame)).await.is_err() {
                    break;
                }
            }
        }
    }

    disconnect(&state, &conn).await;
    info!(connection_id = %conn.id, "ws: client disconnected");
}

async fn send_all(socket: &mut WebSocket, frames: Vec<Frame>) -> bool {
    for frame in frames {
        if socket.send(encode_outbound(&frame)).await.is_err() {
            return false;
        }
    }
    true
}

/// Leave the room and tell whoever is left. Runs once per connection.
async fn disconnect(state: &AppState, conn: &Connection) {
    state.pointer_throttle.forget(conn.id);
    debug!(connection_id = %conn.id, throttle_slots = state.pointer_throttle.len(), "ws: throttle slot released");

    let Some(room_id) = state.presence.leave(conn.id).await else {
        return;
    };
    // The last member leaving drops the room; nobody is left to tell.
    if state.presence.contains_room(&room_id).await {
        announce_departure(state, &room_id, conn.id).await;
    }
}

async fn announce_departure(state: &AppState, room_id: &str, connection_id: Uuid) {
    let left = Frame::event(USER_LEFT, &UserLeft { connection_id: connection_id.to_string() }).with_room_id(room_id);
    let delivered = state.router.notify(room_id, &left).await;
    let remaining = state.presence.participants(room_id).await.len();
    info!(%room_id, %connection_id, delivered, remaining, "ws: user left");
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Process one inbound frame and return frames for the sender.
///
/// Transport concerns stay in `run_ws`, so tests can drive dispatch directly.
async fn process_inbound(state: &AppState, conn: &mut Connection, frame: Frame) -> Vec<Frame> {
    let result = match frame.syscall.as_str() {
        JOIN_CANVAS => handle_join(state, conn, &frame).await,
        MOUSE_MOVE => handle_mouse_move(state, conn, &frame).await,
        CANVAS_UPDATE => handle_canvas_update(state, conn, &frame).await,
        other => Err(GatewayError::UnknownEvent(other.to_owned())),
    };

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(connection_id = %conn.id, syscall = %frame.syscall, code = e.error_code(), error = %e, "ws: dropped inbound frame");
            return Vec::new();
        }
    };

    // Apply outcome; the dispatch layer owns all outbound logic.
    let Some(room_id) = conn.room.as_deref() else {
        return Vec::new();
    };
    match outcome {
        Outcome::BroadcastExcludeSender(relay) => {
            state.router.route(room_id, conn.id, &relay).await;
            Vec::new()
        }
        Outcome::ReplyAndBroadcast { reply, broadcast } => {
            state.router.route(room_id, conn.id, &broadcast).await;
            vec![reply]
        }
        Outcome::Nothing => Vec::new(),
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

async fn handle_join(state: &AppState, conn: &mut Connection, req: &Frame) -> Result<Outcome, GatewayError> {
    let join: JoinCanvas = protocol::decode_payload(req)?;
    join.validate()?;

    let color = join
        .user_color
        .filter(|c| !c.trim().is_empty())
        .or_else(|| conn.identity.color.clone())
        .unwrap_or_else(generated_color);
    let info = ParticipantInfo {
        user_id: conn.identity.user_id.clone(),
        display_name: join.username,
        color,
    };

    let joined = state
        .presence
        .join(&join.room_id, conn.id, info, conn.tx.clone())
        .await;
    if let Some(previous) = &joined.previous_room {
        announce_departure(state, previous, conn.id).await;
    }
    conn.room = Some(join.room_id.clone());

    info!(
        room_id = %join.room_id,
        connection_id = %conn.id,
        user_id = %conn.identity.user_id,
        peers = joined.peers.len(),
        "ws: client joined room"
    );

    let reply = req
        .reply(ACTIVE_USERS, &ActiveUsers { users: joined.peers })
        .with_room_id(join.room_id.clone());
    let broadcast = Frame::event(USER_JOINED, &joined.participant).with_room_id(join.room_id);
    Ok(Outcome::ReplyAndBroadcast { reply, broadcast })
}

async fn handle_mouse_move(state: &AppState, conn: &Connection, req: &Frame) -> Result<Outcome, GatewayError> {
    let moved: MouseMove = protocol::decode_payload(req)?;
    let Some(room_id) = state.presence.update_pointer(conn.id, moved.position).await else {
        return Err(GatewayError::NotJoined(MOUSE_MOVE));
    };

    if !state.pointer_throttle.admit(conn.id) {
        return Ok(Outcome::Nothing);
    }
    let relay = UserMouseMove { connection_id: conn.id.to_string(), position: moved.position };
    Ok(Outcome::BroadcastExcludeSender(Frame::event(USER_MOUSE_MOVE, &relay).with_room_id(room_id)))
}

async fn handle_canvas_update(state: &AppState, conn: &Connection, req: &Frame) -> Result<Outcome, GatewayError> {
    let joined = conn.joined_room(CANVAS_UPDATE)?;
    let mut update: CanvasUpdate = protocol::decode_payload(req)?;
    update.validate()?;
    if update.room_id != joined {
        return Err(GatewayError::WrongRoom { joined: joined.to_owned(), named: update.room_id });
    }

    // Sender identity is always the server's, never the client's claim.
    update.sender_id = Some(conn.id.to_string());
    update.user_id = Some(conn.identity.user_id.clone());

    let active = match update.operation {
        Operation::Add | Operation::Modify => Some(update.object_id.clone()),
        Operation::Delete => None,
    };
    state.presence.set_active_object(conn.id, active).await;

    debug!(
        room_id = %joined,
        connection_id = %conn.id,
        operation = update.operation.as_str(),
        object_id = %update.object_id,
        "ws: canvas-update"
    );

    let relay = Frame::event(CANVAS_UPDATE, &update)
        .with_room_id(joined)
        .with_from(conn.id.to_string());
    Ok(Outcome::BroadcastExcludeSender(relay))
}

// =============================================================================
// HELPERS
// =============================================================================

/// Presence color for a participant that did not bring one.
fn generated_color() -> String {
    let [r, g, b]: [u8; 3] = rand::rng().random();
    format!("#{r:02x}{g:02x}{b:02x}")
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
