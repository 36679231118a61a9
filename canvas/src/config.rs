//! Client sync tuning.

use std::time::Duration;

use crate::consts::{AUTOSAVE_INTERVAL, DEBOUNCE_QUIET, ECHO_GRACE, POINTER_INTERVAL};

/// Timing knobs for a [`crate::session::CollabSession`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncConfig {
    /// Quiet period for coalescing `modify` bursts per object.
    pub debounce: Duration,
    /// Minimum spacing between outbound pointer reports.
    pub pointer_interval: Duration,
    /// Lifetime of a remote-origin echo tag.
    pub echo_grace: Duration,
    /// Minimum spacing between document autosaves.
    pub autosave_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce: DEBOUNCE_QUIET,
            pointer_interval: POINTER_INTERVAL,
            echo_grace: ECHO_GRACE,
            autosave_interval: AUTOSAVE_INTERVAL,
        }
    }
}
