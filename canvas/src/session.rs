//! One client's participation in a room.
//!
//! [`CollabSession`] glues the pieces together: it turns scene events into
//! outbound `canvas-update` frames (adds and deletes immediately, modifies
//! through the debouncer), applies inbound frames through the reconciler,
//! and keeps the collaborator roster current.
//!
//! The session is synchronous and clock-injected. Its owner feeds inbound
//! frames to [`CollabSession::handle_inbound`], calls
//! [`CollabSession::poll`] on a timer, and sends whatever frames come back.
//!
//! Scene events are drained right after every remote apply, while the echo
//! tags are fresh, so a slow poll loop cannot turn a remote change into an
//! outbound echo.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::time::Instant;

use frames::protocol::{
    self, ACTIVE_USERS, CANVAS_UPDATE, JOIN_CANVAS, MOUSE_MOVE, SESSION_CONNECTED,
    USER_JOINED, USER_LEFT, USER_MOUSE_MOVE,
};
use frames::{
    ActiveUsers, CanvasUpdate, Frame, JoinCanvas, MouseMove, Operation, Participant, Point,
    ProjectDocument, SessionConnected, UserLeft, UserMouseMove,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::SyncConfig;
use crate::echo::EchoGuard;
use crate::object::{ObjectId, SyncedObject, generate_object_id};
use crate::presence::{Roster, random_user_color};
use crate::reconcile::{Applied, Reconciler, SyncState};
use crate::scene::{SceneEvent, SceneGraph, SceneStore};
use crate::schedule::{Debouncer, Throttle};

/// Who this client is, as announced on join.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalUser {
    pub user_id: String,
    pub username: String,
    pub color: String,
}

impl LocalUser {
    /// User with a random cursor color.
    #[must_use]
    pub fn new(user_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), username: username.into(), color: random_user_color() }
    }

    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }
}

/// Something the host UI may want to react to.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    Connected { connection_id: String },
    /// `active-users` replaced the roster; carries the peer count.
    RosterReplaced(usize),
    PeerJoined(Participant),
    PeerLeft(String),
    PeerPointer { connection_id: String, position: Point },
    Remote(Applied),
}

pub struct CollabSession<S: SceneGraph = SceneStore> {
    room_id: String,
    user: LocalUser,
    config: SyncConfig,
    connection_id: Option<String>,
    scene: S,
    echo: EchoGuard,
    reconciler: Reconciler,
    debounce: Debouncer<ObjectId, ()>,
    pointer: Throttle<()>,
    roster: Roster,
    outbox: Vec<Frame>,
    /// Background and size of the loaded document, reused by autosave.
    document: ProjectDocument,
    dirty: bool,
    last_autosave: Option<Instant>,
}

impl<S: SceneGraph> CollabSession<S> {
    pub fn new(room_id: impl Into<String>, user: LocalUser, scene: S, config: SyncConfig) -> Self {
        Self {
            room_id: room_id.into(),
            user,
            connection_id: None,
            scene,
            echo: EchoGuard::new(config.echo_grace),
            reconciler: Reconciler::new(),
            debounce: Debouncer::new(config.debounce),
            pointer: Throttle::new(config.pointer_interval),
            roster: Roster::new(),
            outbox: Vec::new(),
            document: ProjectDocument::default(),
            dirty: false,
            last_autosave: None,
            config,
        }
    }

    // --- Accessors ---

    #[must_use]
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    #[must_use]
    pub fn user(&self) -> &LocalUser {
        &self.user
    }

    /// Server-assigned id, known once `session-connected` arrives.
    #[must_use]
    pub fn connection_id(&self) -> Option<&str> {
        self.connection_id.as_deref()
    }

    #[must_use]
    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    #[must_use]
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    #[must_use]
    pub fn sync_state(&self, id: &str) -> SyncState {
        self.reconciler.state(id)
    }

    /// Earliest instant at which [`Self::poll`] has debounced work to flush.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debounce.next_deadline()
    }

    // --- Outbound ---

    #[must_use]
    pub fn join_frame(&self) -> Frame {
        let join = JoinCanvas {
            room_id: self.room_id.clone(),
            user_id: self.user.user_id.clone(),
            username: self.user.username.clone(),
            user_color: Some(self.user.color.clone()),
        };
        Frame::event(JOIN_CANVAS, &join).with_room_id(self.room_id.clone())
    }

    /// Pointer report, if the throttle admits one at `now`.
    pub fn pointer_moved(&mut self, position: Point, now: Instant) -> Option<Frame> {
        if !self.pointer.admit((), now) {
            return None;
        }
        let report = MouseMove { room_id: self.room_id.clone(), position };
        Some(Frame::event(MOUSE_MOVE, &report).with_room_id(self.room_id.clone()))
    }

    /// Collect local changes and flush debounced modifies that are due.
    pub fn poll(&mut self, now: Instant) -> Vec<Frame> {
        self.drain_scene(now);

        for expired in self.echo.sweep(now) {
            log::trace!("echo tag expired for {expired}");
        }

        for (id, ()) in self.debounce.due(now) {
            self.emit_snapshot(Operation::Modify, &id, now);
        }

        std::mem::take(&mut self.outbox)
    }

    fn drain_scene(&mut self, now: Instant) {
        for event in self.scene.take_events() {
            match event {
                SceneEvent::Added(id) => self.on_local_added(&id, now),
                SceneEvent::Modified(id) => self.on_local_modified(id, now),
                SceneEvent::Removed(id) => self.on_local_removed(&id, now),
                SceneEvent::SelectionModified(ids) => {
                    for id in ids {
                        self.on_local_modified(id, now);
                    }
                }
            }
        }
    }

    fn on_local_added(&mut self, id: &str, now: Instant) {
        if self.echo.remote_origin(id, now).is_some() {
            return;
        }
        self.reconciler.mark_local(id);
        self.emit_snapshot(Operation::Add, id, now);
    }

    fn on_local_modified(&mut self, id: ObjectId, now: Instant) {
        if self.echo.remote_origin(&id, now).is_some() {
            return;
        }
        self.debounce.schedule(id, (), now);
        self.dirty = true;
    }

    fn on_local_removed(&mut self, id: &str, now: Instant) {
        let remote = self.echo.remote_origin(id, now).is_some();
        self.echo.forget(id);
        if remote {
            return;
        }
        self.debounce.cancel(&id.to_owned());
        self.reconciler.forget(id);
        let update = CanvasUpdate::new(self.room_id.clone(), Operation::Delete, id, None);
        let frame = self.update_frame(&update);
        self.outbox.push(frame);
        self.dirty = true;
    }

    fn emit_snapshot(&mut self, operation: Operation, id: &str, now: Instant) {
        let Some(object) = self.scene.get(id) else {
            return;
        };
        let snapshot = match object.to_snapshot() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                log::warn!("cannot serialize {id} for {}: {err}", operation.as_str());
                return;
            }
        };

        let update = CanvasUpdate::new(self.room_id.clone(), operation, id, Some(snapshot));
        let frame = self.update_frame(&update);
        self.outbox.push(frame);
        self.reconciler.mark_emitted(id);
        self.echo.mark_pending(id, now);
        self.dirty = true;
    }

    fn update_frame(&self, update: &CanvasUpdate) -> Frame {
        Frame::event(CANVAS_UPDATE, update).with_room_id(self.room_id.clone())
    }

    // --- Inbound ---

    /// Apply one frame from the server.
    pub fn handle_inbound(&mut self, frame: &Frame, now: Instant) -> Option<SessionEvent> {
        match frame.syscall.as_str() {
            SESSION_CONNECTED => {
                let connected: SessionConnected = decode(frame)?;
                self.roster.set_own_connection(&connected.connection_id);
                self.connection_id = Some(connected.connection_id.clone());
                Some(SessionEvent::Connected { connection_id: connected.connection_id })
            }
            ACTIVE_USERS => {
                let active: ActiveUsers = decode(frame)?;
                self.roster.replace(active.users);
                Some(SessionEvent::RosterReplaced(self.roster.len()))
            }
            USER_JOINED => {
                let participant: Participant = decode(frame)?;
                self.roster
                    .upsert(participant.clone())
                    .then_some(SessionEvent::PeerJoined(participant))
            }
            USER_LEFT => {
                let left: UserLeft = decode(frame)?;
                self.roster.remove(&left.connection_id)?;
                Some(SessionEvent::PeerLeft(left.connection_id))
            }
            USER_MOUSE_MOVE => {
                let moved: UserMouseMove = decode(frame)?;
                self.roster
                    .move_pointer(&moved.connection_id, moved.position)
                    .then_some(SessionEvent::PeerPointer {
                        connection_id: moved.connection_id,
                        position: moved.position,
                    })
            }
            CANVAS_UPDATE => {
                let update: CanvasUpdate = decode(frame)?;
                self.apply_remote(&update, now)
            }
            other => {
                log::debug!("ignoring unexpected event {other}");
                None
            }
        }
    }

    fn apply_remote(&mut self, update: &CanvasUpdate, now: Instant) -> Option<SessionEvent> {
        if update.room_id != self.room_id {
            log::debug!("dropping update for room {} while in {}", update.room_id, self.room_id);
            return None;
        }
        if self.connection_id.is_some() && update.sender_id == self.connection_id {
            log::debug!("dropping self-delivered update for {}", update.object_id);
            return None;
        }
        if self.echo.is_pending(&update.object_id, now) {
            log::debug!("remote edit of {} overrides an in-flight local edit", update.object_id);
        }
        // Edits already queued by the user are local; only what the apply raises is remote.
        self.drain_scene(now);

        match self.reconciler.apply(&mut self.scene, &mut self.echo, update, now) {
            Ok(applied) => {
                // A queued local modify would resend the state we just replaced.
                if let Applied::Updated(id) | Applied::Removed(id) = &applied {
                    self.debounce.cancel(id);
                }
                if applied.changed_scene() {
                    self.dirty = true;
                }
                self.drain_scene(now);
                self.echo.settle(applied.object_id());
                Some(SessionEvent::Remote(applied))
            }
            Err(err) => {
                log::warn!("skipping remote {}: {err}", update.operation.as_str());
                None
            }
        }
    }

    // --- Document ---

    /// Seed the scene from the persisted document. Loaded objects are
    /// already known to peers, so no `add` is emitted for them.
    /// Returns the number of objects loaded.
    pub fn load_document(&mut self, document: &ProjectDocument, now: Instant) -> usize {
        self.drain_scene(now);

        let mut loaded = 0;
        for snapshot in &document.canvas_data {
            let id = snapshot
                .get("id")
                .and_then(Value::as_str)
                .filter(|id| !id.is_empty())
                .map_or_else(generate_object_id, str::to_owned);
            match SyncedObject::from_snapshot(&id, snapshot) {
                Ok(object) => {
                    self.scene.insert(object);
                    self.reconciler.mark_synced(&id);
                    loaded += 1;
                }
                Err(err) => log::warn!("skipping stored object: {err}"),
            }
        }

        let suppressed = self.scene.take_events();
        log::debug!("initial load suppressed {} scene events", suppressed.len());

        self.document = ProjectDocument { canvas_data: Vec::new(), ..document.clone() };
        self.dirty = false;
        self.last_autosave = Some(now);
        loaded
    }

    /// Document snapshot to persist, when the scene changed and the
    /// autosave interval has elapsed since the last save.
    pub fn autosave_due(&mut self, now: Instant) -> Option<ProjectDocument> {
        if !self.dirty {
            return None;
        }
        if let Some(last) = self.last_autosave {
            if now.saturating_duration_since(last) < self.config.autosave_interval {
                return None;
            }
        }

        let mut canvas_data = Vec::new();
        for object in self.scene.objects() {
            match object.to_snapshot() {
                Ok(snapshot) => canvas_data.push(snapshot),
                Err(err) => log::warn!("autosave skipping {}: {err}", object.id),
            }
        }

        self.dirty = false;
        self.last_autosave = Some(now);
        Some(ProjectDocument {
            canvas_data,
            last_edited: frames::now_ms(),
            ..self.document.clone()
        })
    }

    // --- Teardown ---

    /// Cancel all timers and drop all transient tags. The scene is kept.
    pub fn teardown(&mut self) {
        self.debounce.clear();
        self.pointer.clear();
        self.echo.clear();
        self.roster.clear();
        self.outbox.clear();
        self.connection_id = None;
    }
}

fn decode<T: DeserializeOwned>(frame: &Frame) -> Option<T> {
    match protocol::decode_payload(frame) {
        Ok(payload) => Some(payload),
        Err(err) => {
            log::warn!("dropping malformed {}: {err}", frame.syscall);
            None
        }
    }
}
