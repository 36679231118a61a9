//! Client-side sync core for the collaborative canvas.
//!
//! This crate sits between a drawing toolkit and the room socket. It turns
//! local scene changes into `canvas-update` frames, applies peers' frames to
//! the local scene without echoing them back, and tracks who else is in the
//! room. It has no I/O of its own: the owner passes in frames and the current
//! time, and sends out whatever frames come back.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`session`] | [`session::CollabSession`], the per-room driver |
//! | [`object`] | Synced object types and snapshot (de)serialization |
//! | [`scene`] | [`scene::SceneGraph`] seam and the in-memory [`scene::SceneStore`] |
//! | [`reconcile`] | Applying remote mutations, per-object sync state |
//! | [`echo`] | Remote-origin side table that suppresses echoes |
//! | [`schedule`] | Per-key debounce and throttle tables |
//! | [`presence`] | Collaborator roster |
//! | [`config`] | Timing knobs |
//! | [`consts`] | Shared constants (timing defaults, id format, text metrics) |

pub mod config;
pub mod consts;
pub mod echo;
pub mod object;
pub mod presence;
pub mod reconcile;
pub mod scene;
pub mod schedule;
pub mod session;

pub use config::SyncConfig;
pub use object::{ObjectId, Shape, ShapeKind, SyncedObject};
pub use reconcile::{Applied, ReconcileError, SyncState};
pub use scene::{SceneEvent, SceneGraph, SceneStore};
pub use session::{CollabSession, LocalUser, SessionEvent};
