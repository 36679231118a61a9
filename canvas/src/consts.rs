//! Shared constants for the canvas sync core.

use std::time::Duration;

// ── Scheduling ──────────────────────────────────────────────────

/// Quiet period before a burst of `modify` edits to one object is sent.
pub const DEBOUNCE_QUIET: Duration = Duration::from_millis(60);

/// Minimum spacing between pointer reports.
pub const POINTER_INTERVAL: Duration = Duration::from_millis(50);

/// How long a remote-origin tag suppresses re-emission.
pub const ECHO_GRACE: Duration = Duration::from_millis(300);

/// Minimum spacing between document autosaves.
pub const AUTOSAVE_INTERVAL: Duration = Duration::from_secs(5);

// ── Identity ────────────────────────────────────────────────────

/// Prefix of generated durable object ids.
pub const OBJECT_ID_PREFIX: &str = "obj";

/// Number of random base-36 characters at the end of a durable id.
pub const OBJECT_ID_SUFFIX_LEN: usize = 9;

// ── Geometry ────────────────────────────────────────────────────

/// Default text size when a snapshot omits `fontSize`.
pub const DEFAULT_FONT_SIZE: f64 = 20.0;

/// Default font when a snapshot omits `fontFamily`.
pub const DEFAULT_FONT_FAMILY: &str = "Arial";

/// Average glyph advance as a fraction of the font size.
pub const TEXT_ADVANCE_RATIO: f64 = 0.6;

/// Line box height as a multiple of the font size.
pub const TEXT_LINE_HEIGHT: f64 = 1.16;
