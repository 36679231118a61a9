//! Durable project document exchanged over the HTTP document endpoint.
//!
//! The live operation stream is never persisted; this snapshot is what a
//! client loads before joining a room and what autosave writes back.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_BACKGROUND_COLOR: &str = "#f8f9fa";
pub const DEFAULT_WIDTH: f64 = 1400.0;
pub const DEFAULT_HEIGHT: f64 = 600.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDocument {
    /// Serialized object snapshots, each carrying its durable `id`.
    #[serde(default)]
    pub canvas_data: Vec<Value>,
    #[serde(default = "default_background_color")]
    pub background_color: String,
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
    /// Milliseconds since the Unix epoch of the last write.
    #[serde(default)]
    pub last_edited: i64,
}

impl Default for ProjectDocument {
    fn default() -> Self {
        Self {
            canvas_data: Vec::new(),
            background_color: default_background_color(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            last_edited: 0,
        }
    }
}

impl ProjectDocument {
    /// Document holding `objects`, stamped with the current time.
    #[must_use]
    pub fn with_objects(objects: Vec<Value>) -> Self {
        Self { canvas_data: objects, last_edited: crate::now_ms(), ..Self::default() }
    }

    /// Durable ids of the stored objects, skipping snapshots without one.
    pub fn object_ids(&self) -> impl Iterator<Item = &str> {
        self.canvas_data
            .iter()
            .filter_map(|snapshot| snapshot.get("id").and_then(Value::as_str))
    }
}

fn default_background_color() -> String {
    DEFAULT_BACKGROUND_COLOR.to_owned()
}

fn default_width() -> f64 {
    DEFAULT_WIDTH
}

fn default_height() -> f64 {
    DEFAULT_HEIGHT
}

#[cfg(test)]
#[path = "document_test.rs"]
mod tests;
