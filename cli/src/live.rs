//! Live room participation over the websocket.
//!
//! A `LiveRoom` pairs one socket with one `CollabSession`. The session is
//! synchronous and clock-injected, so this module owns the timing: it feeds
//! inbound frames in as they arrive and polls the session on a short tick.

use std::time::{Duration, Instant};

use canvas::object::{Placement, Style};
use canvas::{Applied, CollabSession, LocalUser, SceneStore, SessionEvent, Shape, SyncConfig, SyncedObject};
use frames::Frame;
use frames::protocol::{ACTIVE_USERS, SESSION_CONNECTED};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::api::ApiClient;
use crate::{CliError, DrawArgs, RoomArgs, WatchArgs};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);
const POLL_TICK: Duration = Duration::from_millis(20);
const DRAG_STEP: Duration = Duration::from_millis(5);
const DRAW_ORIGIN: (f64, f64) = (100.0, 100.0);

// =============================================================================
// ROOM CONNECTION
// =============================================================================

struct LiveRoom {
    stream: WsStream,
    session: CollabSession,
}

impl LiveRoom {
    async fn connect(api: &ApiClient, token: &str, room: &RoomArgs) -> Result<Self, CliError> {
        let mut user = LocalUser::new(token, room.username.clone());
        if let Some(color) = &room.color {
            user = user.with_color(color.clone());
        }
        let session = CollabSession::new(room.room_id.clone(), user, SceneStore::new(), SyncConfig::default());

        let (stream, _) = connect_async(api.ws_url(token)).await?;
        let mut live = Self { stream, session };
        live.wait_for(SESSION_CONNECTED).await?;
        Ok(live)
    }

    async fn join(&mut self) -> Result<(), CliError> {
        let join = self.session.join_frame();
        self.send(&join).await?;
        self.wait_for(ACTIVE_USERS).await
    }

    /// Feed frames to the session until one named `syscall` arrives.
    async fn wait_for(&mut self, syscall: &'static str) -> Result<(), CliError> {
        loop {
            let frame = tokio::time::timeout(HANDSHAKE_TIMEOUT, next_frame(&mut self.stream))
                .await
                .map_err(|_| CliError::Timeout(syscall))??;
            if let Some(event) = self.session.handle_inbound(&frame, Instant::now()) {
                println!("{}", describe(&event));
            }
            if frame.syscall == syscall {
                return Ok(());
            }
        }
    }

    async fn send(&mut self, frame: &Frame) -> Result<(), CliError> {
        self.stream.send(Message::Binary(frames::encode_frame(frame).into())).await?;
        Ok(())
    }

    /// Poll the session and send whatever it emits.
    async fn flush(&mut self, now: Instant) -> Result<usize, CliError> {
        let frames = self.session.poll(now);
        for frame in &frames {
            self.send(frame).await?;
        }
        Ok(frames.len())
    }

    async fn close(mut self) -> Result<(), CliError> {
        self.session.teardown();
        self.stream.close(None).await?;
        Ok(())
    }
}

async fn next_frame(stream: &mut WsStream) -> Result<Frame, CliError> {
    loop {
        let Some(message) = stream.next().await else {
            return Err(CliError::WsClosed);
        };
        match message? {
            Message::Binary(bytes) => return Ok(frames::decode_frame(&bytes)?),
            Message::Text(text) => return Ok(serde_json::from_str(text.as_str())?),
            Message::Close(_) => return Err(CliError::WsClosed),
            _ => {}
        }
    }
}

// =============================================================================
// COMMANDS
// =============================================================================

pub(crate) async fn watch(api: &ApiClient, token: String, args: WatchArgs) -> Result<(), CliError> {
    let room_id = args.room.room_id.clone();
    let mut live = LiveRoom::connect(api, &token, &args.room).await?;

    if args.load {
        if let Some(document) = api.find_document(&room_id).await? {
            let loaded = live.session.load_document(&document, Instant::now());
            println!("loaded {loaded} objects");
        }
    }
    live.join().await?;

    let stop = async {
        match args.duration() {
            Some(limit) => tokio::time::sleep(limit).await,
            None => {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::warn!(error = %e, "ctrl-c handler unavailable");
                    std::future::pending::<()>().await;
                }
            }
        }
    };
    tokio::pin!(stop);
    let mut tick = tokio::time::interval(POLL_TICK);

    loop {
        tokio::select! {
            () = &mut stop => break,
            frame = next_frame(&mut live.stream) => {
                let frame = frame?;
                if let Some(event) = live.session.handle_inbound(&frame, Instant::now()) {
                    println!("{}", describe(&event));
                }
            }
            _ = tick.tick() => {
                let now = Instant::now();
                live.flush(now).await?;
                if args.autosave {
                    if let Some(document) = live.session.autosave_due(now) {
                        let saved = api.put_document(&room_id, &document).await?;
                        tracing::info!(%room_id, objects = saved.canvas_data.len(), "autosaved document");
                    }
                }
            }
        }
    }

    live.close().await
}

pub(crate) async fn draw(api: &ApiClient, token: String, args: DrawArgs) -> Result<(), CliError> {
    let room_id = args.room.room_id.clone();
    let mut live = LiveRoom::connect(api, &token, &args.room).await?;
    live.join().await?;

    let id = live.session.scene_mut().add_local(rectangle(&args.fill));
    live.flush(Instant::now()).await?;
    println!("added {id}");

    let mut left = DRAW_ORIGIN.0;
    for step in 1..=args.steps {
        tokio::time::sleep(DRAG_STEP).await;
        left = drag_position(args.distance, step, args.steps);
        live.session
            .scene_mut()
            .modify_local(&id, |object| object.placement.left = left);
        live.flush(Instant::now()).await?;
    }

    // Let the debounce window close so the final position goes out.
    if let Some(deadline) = live.session.next_deadline() {
        tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await;
    }
    let modifies = live.flush(Instant::now()).await?;
    println!("dragged {id} to x={left} in {} steps, {modifies} modify sent", args.steps);

    if args.save {
        if let Some(document) = live.session.autosave_due(Instant::now()) {
            let saved = api.put_document(&room_id, &document).await?;
            println!("saved {} objects to {room_id}", saved.canvas_data.len());
        }
    }

    live.close().await
}

// =============================================================================
// HELPERS
// =============================================================================

fn rectangle(fill: &str) -> SyncedObject {
    SyncedObject::new(
        Shape::Rectangle { width: 120.0, height: 80.0, rx: 0.0, ry: 0.0 },
        Placement::at(DRAW_ORIGIN.0, DRAW_ORIGIN.1),
        Style { fill: Some(fill.to_owned()), ..Style::default() },
    )
}

/// Horizontal position after `step` of `steps` evenly spaced moves.
fn drag_position(distance: f64, step: u32, steps: u32) -> f64 {
    DRAW_ORIGIN.0 + distance * f64::from(step) / f64::from(steps.max(1))
}

/// One printable line per session event.
fn describe(event: &SessionEvent) -> String {
    match event {
        SessionEvent::Connected { connection_id } => format!("connected {connection_id}"),
        SessionEvent::RosterReplaced(count) => format!("room has {count} other participant(s)"),
        SessionEvent::PeerJoined(peer) => {
            format!("joined {} {} as {} {}", peer.connection_id, peer.user_id, peer.display_name, peer.color)
        }
        SessionEvent::PeerLeft(connection_id) => format!("left {connection_id}"),
        SessionEvent::PeerPointer { connection_id, position } => {
            format!("pointer {connection_id} {},{}", position.x, position.y)
        }
        SessionEvent::Remote(applied) => match applied {
            Applied::Inserted(id) => format!("add {id}"),
            Applied::Updated(id) => format!("modify {id}"),
            Applied::Removed(id) => format!("delete {id}"),
            Applied::Deferred(id) => format!("deferred {id} (selected locally)"),
            Applied::Ignored(id) => format!("ignored {id}"),
        },
    }
}

#[cfg(test)]
#[path = "live_test.rs"]
mod tests;
