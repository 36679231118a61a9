//! Applying remote mutations to the local scene.
//!
//! DESIGN
//! ======
//! Each durable id moves through a small state machine:
//!
//! ```text
//!   Unknown ──local add──▶ LocalOnly ──add emitted──▶ Synced
//!   Unknown ──remote add/modify──────────────────────▶ Synced
//!   Synced  ──remote modify while selected──▶ RemotePending ──next local emit──▶ Synced
//!   any     ──delete─────────────────────────────────▶ Unknown
//! ```
//!
//! There is no central lock and no merge: the last message applied wins.
//! The one exception is an object the local user is actively manipulating,
//! whose remote `modify` is dropped so the user's gesture is not yanked
//! away mid-drag. The user's own next emission then overwrites peers.
//!
//! ERROR HANDLING
//! ==============
//! A snapshot that cannot be rebuilt is returned as [`ReconcileError`]; the
//! caller logs it and moves on to the next event. The scene is left untouched.

#[cfg(test)]
#[path = "reconcile_test.rs"]
mod reconcile_test;

use std::collections::HashMap;
use std::time::Instant;

use frames::{CanvasUpdate, Operation};

use crate::echo::EchoGuard;
use crate::object::{ObjectId, SyncedObject};
use crate::scene::SceneGraph;

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("object {object_id}: unknown shape type `{type_tag}`")]
    UnknownType { object_id: String, type_tag: String },
    #[error("object {object_id}: invalid snapshot: {reason}")]
    InvalidSnapshot { object_id: String, reason: String },
    #[error("object {object_id}: {operation} without a snapshot")]
    MissingSnapshot { object_id: String, operation: &'static str },
}

/// Sync position of one durable id.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncState {
    #[default]
    Unknown,
    /// Created locally, add not yet transmitted.
    LocalOnly,
    /// Local copy matches the last transmitted or applied state.
    Synced,
    /// A remote modify was dropped because the object was under local edit.
    RemotePending,
}

/// What an inbound mutation did to the scene.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Applied {
    Inserted(ObjectId),
    Updated(ObjectId),
    Removed(ObjectId),
    /// Dropped because the object is in the local selection.
    Deferred(ObjectId),
    /// Delete of an object we never had.
    Ignored(ObjectId),
}

impl Applied {
    #[must_use]
    pub fn object_id(&self) -> &str {
        match self {
            Self::Inserted(id)
            | Self::Updated(id)
            | Self::Removed(id)
            | Self::Deferred(id)
            | Self::Ignored(id) => id,
        }
    }

    /// Whether the scene changed.
    #[must_use]
    pub fn changed_scene(&self) -> bool {
        matches!(self, Self::Inserted(_) | Self::Updated(_) | Self::Removed(_))
    }
}

#[derive(Debug, Default)]
pub struct Reconciler {
    states: HashMap<ObjectId, SyncState>,
}

impl Reconciler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self, id: &str) -> SyncState {
        self.states.get(id).copied().unwrap_or_default()
    }

    /// A local add is waiting to be transmitted.
    pub fn mark_local(&mut self, id: &str) {
        self.states.insert(id.to_owned(), SyncState::LocalOnly);
    }

    /// An add or modify for `id` went out; whatever we deferred is now moot.
    pub fn mark_emitted(&mut self, id: &str) {
        self.states.insert(id.to_owned(), SyncState::Synced);
    }

    /// Loaded from the persisted document; peers already have it.
    pub fn mark_synced(&mut self, id: &str) {
        self.states.insert(id.to_owned(), SyncState::Synced);
    }

    pub fn forget(&mut self, id: &str) {
        self.states.remove(id);
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }

    /// Apply one inbound `canvas-update` to `scene`, tagging touched
    /// objects as remote-origin in `echo` before the scene raises events.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] when an add/modify snapshot is missing or
    /// cannot be rebuilt into a [`SyncedObject`].
    pub fn apply<S: SceneGraph>(
        &mut self,
        scene: &mut S,
        echo: &mut EchoGuard,
        update: &CanvasUpdate,
        now: Instant,
    ) -> Result<Applied, ReconcileError> {
        let id = update.object_id.as_str();
        let sender = update.sender_id.as_deref().unwrap_or_default();

        match update.operation {
            Operation::Add | Operation::Modify => {
                let Some(snapshot) = update.object.as_ref() else {
                    return Err(ReconcileError::MissingSnapshot {
                        object_id: id.to_owned(),
                        operation: update.operation.as_str(),
                    });
                };
                let incoming = SyncedObject::from_snapshot(id, snapshot)?;

                // A duplicate add takes the modify path so it never yields two objects.
                if scene.get(id).is_none() {
                    echo.mark_remote(id, sender, now);
                    scene.insert(incoming);
                    self.states.insert(id.to_owned(), SyncState::Synced);
                    return Ok(Applied::Inserted(id.to_owned()));
                }

                if scene.is_actively_edited(id) {
                    self.states.insert(id.to_owned(), SyncState::RemotePending);
                    return Ok(Applied::Deferred(id.to_owned()));
                }

                echo.mark_remote(id, sender, now);
                scene.update(id, incoming);
                self.states.insert(id.to_owned(), SyncState::Synced);
                Ok(Applied::Updated(id.to_owned()))
            }
            Operation::Delete => {
                if scene.get(id).is_none() {
                    return Ok(Applied::Ignored(id.to_owned()));
                }
                echo.mark_remote(id, sender, now);
                scene.remove(id);
                self.states.remove(id);
                Ok(Applied::Removed(id.to_owned()))
            }
        }
    }
}
