//! Synced objects: the closed set of shapes that travel between peers.
//!
//! A [`SyncedObject`] is the typed form of the JSON snapshot carried in a
//! `canvas-update` frame. The wire form is flat:
//!
//! ```json
//! {"type": "rectangle", "id": "obj_1700000000000_k3j9x0a1b",
//!  "width": 120, "height": 80, "left": 10, "top": 20, "fill": "#3498db"}
//! ```
//!
//! Shape-specific attributes live on the [`Shape`] variant; placement and
//! style attributes are shared by every variant. Reconstruction goes through
//! [`SyncedObject::from_snapshot`], which checks the `type` tag against
//! [`ShapeKind`] before decoding so an unknown shape is reported as such
//! rather than as a generic decode failure.
//!
//! Echo-suppression tags are NOT stored here; see [`crate::echo`].

#[cfg(test)]
#[path = "object_test.rs"]
mod object_test;

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::consts::{
    DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE, OBJECT_ID_PREFIX, OBJECT_ID_SUFFIX_LEN,
    TEXT_ADVANCE_RATIO, TEXT_LINE_HEIGHT,
};
use crate::reconcile::ReconcileError;

/// Durable object identifier, stable across serialize/deserialize.
pub type ObjectId = String;

/// One free-form path command, e.g. `["M", 10, 20]` or `["Q", 1, 2, 3, 4]`.
pub type PathCommand = Vec<Value>;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

// =============================================================================
// SHAPES
// =============================================================================

/// Shape discriminant, resolved from a snapshot's `type` tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Rectangle,
    Ellipse,
    Circle,
    Triangle,
    Line,
    Text,
    Path,
    Group,
}

impl ShapeKind {
    /// Resolve a wire `type` tag, accepting the short names older clients
    /// emit (`rect`, `i-text`, `textbox`).
    #[must_use]
    pub fn from_type_tag(tag: &str) -> Option<Self> {
        match tag {
            "rectangle" | "rect" => Some(Self::Rectangle),
            "ellipse" => Some(Self::Ellipse),
            "circle" => Some(Self::Circle),
            "triangle" => Some(Self::Triangle),
            "line" => Some(Self::Line),
            "text" | "i-text" | "textbox" => Some(Self::Text),
            "path" => Some(Self::Path),
            "group" => Some(Self::Group),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rectangle => "rectangle",
            Self::Ellipse => "ellipse",
            Self::Circle => "circle",
            Self::Triangle => "triangle",
            Self::Line => "line",
            Self::Text => "text",
            Self::Path => "path",
            Self::Group => "group",
        }
    }
}

/// Type-specific geometry. Lengths are in local (unscaled) units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Shape {
    #[serde(alias = "rect")]
    Rectangle {
        width: f64,
        height: f64,
        /// Corner radii.
        #[serde(default)]
        rx: f64,
        #[serde(default)]
        ry: f64,
    },
    Ellipse {
        rx: f64,
        ry: f64,
    },
    Circle {
        radius: f64,
    },
    Triangle {
        width: f64,
        height: f64,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    /// Editable text.
    #[serde(alias = "i-text", alias = "textbox")]
    Text {
        text: String,
        #[serde(default = "default_font_size")]
        font_size: f64,
        #[serde(default = "default_font_family")]
        font_family: String,
    },
    /// Free-form drawing.
    Path {
        path: Vec<PathCommand>,
    },
    /// Grouped selection; member placements are relative to the group origin.
    Group {
        objects: Vec<SyncedObject>,
    },
}

impl Shape {
    #[must_use]
    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Rectangle { .. } => ShapeKind::Rectangle,
            Self::Ellipse { .. } => ShapeKind::Ellipse,
            Self::Circle { .. } => ShapeKind::Circle,
            Self::Triangle { .. } => ShapeKind::Triangle,
            Self::Line { .. } => ShapeKind::Line,
            Self::Text { .. } => ShapeKind::Text,
            Self::Path { .. } => ShapeKind::Path,
            Self::Group { .. } => ShapeKind::Group,
        }
    }

    /// Extent in local coordinates before placement is applied.
    #[must_use]
    pub fn local_extent(&self) -> Bounds {
        match self {
            Self::Rectangle { width, height, .. } | Self::Triangle { width, height } => {
                Bounds::sized(*width, *height)
            }
            Self::Ellipse { rx, ry } => Bounds::sized(rx * 2.0, ry * 2.0),
            Self::Circle { radius } => Bounds::sized(radius * 2.0, radius * 2.0),
            Self::Line { x1, y1, x2, y2 } => Bounds::sized((x2 - x1).abs(), (y2 - y1).abs()),
            Self::Text { text, font_size, .. } => text_extent(text, *font_size),
            Self::Path { path } => path_extent(path),
            Self::Group { objects } => objects
                .iter()
                .map(SyncedObject::bounds)
                .reduce(Bounds::union)
                .unwrap_or_default(),
        }
    }
}

fn default_font_size() -> f64 {
    DEFAULT_FONT_SIZE
}

fn default_font_family() -> String {
    DEFAULT_FONT_FAMILY.to_owned()
}

fn text_extent(text: &str, font_size: f64) -> Bounds {
    let lines = text.split('\n');
    let (count, longest) = lines.fold((0_usize, 0_usize), |(count, longest), line| {
        (count + 1, longest.max(line.chars().count()))
    });
    #[allow(clippy::cast_precision_loss)]
    let (count, longest) = (count.max(1) as f64, longest as f64);
    Bounds::sized(longest * font_size * TEXT_ADVANCE_RATIO, count * font_size * TEXT_LINE_HEIGHT)
}

/// Path extent from the command coordinates. Control points are included, so
/// curves get a conservative box. Arc commands contribute only their endpoint.
fn path_extent(path: &[PathCommand]) -> Bounds {
    let mut extent: Option<Bounds> = None;
    let mut include = |x: f64, y: f64| {
        let point = Bounds { left: x, top: y, width: 0.0, height: 0.0 };
        extent = Some(extent.map_or(point, |acc| acc.union(point)));
    };

    for command in path {
        let Some((op, args)) = command.split_first() else {
            continue;
        };
        let nums: Vec<f64> = args.iter().filter_map(Value::as_f64).collect();
        match op.as_str() {
            Some("A" | "a") => {
                if let [.., x, y] = nums[..] {
                    include(x, y);
                }
            }
            Some(_) => {
                for pair in nums.chunks_exact(2) {
                    if let [x, y] = *pair {
                        include(x, y);
                    }
                }
            }
            None => {}
        }
    }

    extent.map_or_else(Bounds::default, |b| Bounds::sized(b.width, b.height))
}

// =============================================================================
// SHARED ATTRIBUTES
// =============================================================================

/// Position and transform, shared by every shape. The origin is the
/// object's top-left corner; `angle` is clockwise degrees about it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub top: f64,
    #[serde(default = "unit")]
    pub scale_x: f64,
    #[serde(default = "unit")]
    pub scale_y: f64,
    #[serde(default)]
    pub angle: f64,
}

impl Default for Placement {
    fn default() -> Self {
        Self { left: 0.0, top: 0.0, scale_x: 1.0, scale_y: 1.0, angle: 0.0 }
    }
}

impl Placement {
    #[must_use]
    pub fn at(left: f64, top: f64) -> Self {
        Self { left, top, ..Self::default() }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default = "unit")]
    pub stroke_width: f64,
    #[serde(default = "unit")]
    pub opacity: f64,
}

impl Default for Style {
    fn default() -> Self {
        Self { fill: None, stroke: None, stroke_width: 1.0, opacity: 1.0 }
    }
}

fn unit() -> f64 {
    1.0
}

/// Axis-aligned bounding box in world coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    #[must_use]
    pub fn sized(width: f64, height: f64) -> Self {
        Self { left: 0.0, top: 0.0, width, height }
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    #[must_use]
    pub fn union(self, other: Self) -> Self {
        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        Self {
            left,
            top,
            width: self.right().max(other.right()) - left,
            height: self.bottom().max(other.bottom()) - top,
        }
    }
}

// =============================================================================
// SYNCED OBJECT
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SyncedObject {
    /// Empty until [`SyncedObject::ensure_id`] assigns one.
    #[serde(default)]
    pub id: ObjectId,
    #[serde(flatten)]
    pub shape: Shape,
    #[serde(flatten)]
    pub placement: Placement,
    #[serde(flatten)]
    pub style: Style,
}

impl SyncedObject {
    /// New object without a durable id.
    #[must_use]
    pub fn new(shape: Shape, placement: Placement, style: Style) -> Self {
        Self { id: String::new(), shape, placement, style }
    }

    /// Rebuild an object from a wire snapshot. `object_id` is authoritative:
    /// it overrides any `id` inside the snapshot.
    ///
    /// # Errors
    ///
    /// `UnknownType` when the `type` tag names no known shape,
    /// `InvalidSnapshot` when the tag is missing or attributes fail to decode.
    pub fn from_snapshot(object_id: &str, snapshot: &Value) -> Result<Self, ReconcileError> {
        let Some(tag) = snapshot.get("type").and_then(Value::as_str) else {
            return Err(ReconcileError::InvalidSnapshot {
                object_id: object_id.to_owned(),
                reason: "missing `type` tag".to_owned(),
            });
        };
        if ShapeKind::from_type_tag(tag).is_none() {
            return Err(ReconcileError::UnknownType {
                object_id: object_id.to_owned(),
                type_tag: tag.to_owned(),
            });
        }

        let mut object = Self::deserialize(snapshot).map_err(|err| ReconcileError::InvalidSnapshot {
            object_id: object_id.to_owned(),
            reason: err.to_string(),
        })?;
        object.id = object_id.to_owned();
        Ok(object)
    }

    /// Serialize to the flat wire snapshot.
    ///
    /// # Errors
    ///
    /// Propagates `serde_json` serialization failures.
    pub fn to_snapshot(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Copy every serializable attribute from `other`, keeping this object's id.
    pub fn assign_from(&mut self, other: Self) {
        self.shape = other.shape;
        self.placement = other.placement;
        self.style = other.style;
    }

    /// Assign a durable id if the object has none; returns the id.
    pub fn ensure_id(&mut self) -> &str {
        if self.id.is_empty() {
            self.id = generate_object_id();
        }
        &self.id
    }

    #[must_use]
    pub fn kind(&self) -> ShapeKind {
        self.shape.kind()
    }

    /// World-space bounding box after scale and rotation.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        let local = self.shape.local_extent();
        let p = &self.placement;
        let (sin, cos) = p.angle.to_radians().sin_cos();
        let corners = [
            (local.left, local.top),
            (local.right(), local.top),
            (local.right(), local.bottom()),
            (local.left, local.bottom()),
        ];

        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for (x, y) in corners {
            let (sx, sy) = (x * p.scale_x, y * p.scale_y);
            let wx = p.left + sx * cos - sy * sin;
            let wy = p.top + sx * sin + sy * cos;
            min_x = min_x.min(wx);
            min_y = min_y.min(wy);
            max_x = max_x.max(wx);
            max_y = max_y.max(wy);
        }
        Bounds { left: min_x, top: min_y, width: max_x - min_x, height: max_y - min_y }
    }
}

/// Generate a durable id: `obj_<unix millis>_<9 random base-36 chars>`.
#[must_use]
pub fn generate_object_id() -> ObjectId {
    let mut rng = rand::rng();
    let suffix: String = (0..OBJECT_ID_SUFFIX_LEN)
        .map(|_| char::from(BASE36[rng.random_range(0..BASE36.len())]))
        .collect();
    format!("{OBJECT_ID_PREFIX}_{}_{suffix}", frames::now_ms())
}
