#![allow(clippy::float_cmp)]

use std::time::Instant;

use serde_json::{Value, json};

use crate::scene::{SceneEvent, SceneStore};

use super::*;

fn rect_snapshot(left: f64, fill: &str) -> Value {
    json!({"type": "rectangle", "width": 40, "height": 30, "left": left, "top": 0, "fill": fill})
}

fn update(operation: Operation, id: &str, object: Option<Value>) -> CanvasUpdate {
    let mut update = CanvasUpdate::new("room-1", operation, id, object);
    update.sender_id = Some("conn-b".into());
    update
}

struct Harness {
    scene: SceneStore,
    echo: EchoGuard,
    reconciler: Reconciler,
    now: Instant,
}

impl Harness {
    fn new() -> Self {
        Self { scene: SceneStore::new(), echo: EchoGuard::default(), reconciler: Reconciler::new(), now: Instant::now() }
    }

    fn apply(&mut self, update: &CanvasUpdate) -> Result<Applied, ReconcileError> {
        self.reconciler.apply(&mut self.scene, &mut self.echo, update, self.now)
    }
}

// =============================================================
// add
// =============================================================

#[test]
fn remote_add_inserts_tagged_object() {
    let mut h = Harness::new();
    let applied = h.apply(&update(Operation::Add, "r1", Some(rect_snapshot(10.0, "#3498db")))).unwrap();

    assert_eq!(applied, Applied::Inserted("r1".into()));
    assert_eq!(h.scene.get("r1").unwrap().style.fill.as_deref(), Some("#3498db"));
    assert_eq!(h.echo.remote_origin("r1", h.now), Some("conn-b"));
    assert_eq!(h.reconciler.state("r1"), SyncState::Synced);
}

#[test]
fn duplicate_add_yields_one_object() {
    let mut h = Harness::new();
    h.apply(&update(Operation::Add, "r1", Some(rect_snapshot(10.0, "#111111")))).unwrap();
    let second = h.apply(&update(Operation::Add, "r1", Some(rect_snapshot(20.0, "#222222")))).unwrap();

    assert_eq!(second, Applied::Updated("r1".into()));
    assert_eq!(h.scene.len(), 1);
    assert_eq!(h.scene.get("r1").unwrap().placement.left, 20.0);
}

#[test]
fn add_without_snapshot_is_an_error() {
    let mut h = Harness::new();
    let err = h.apply(&update(Operation::Add, "r1", None)).unwrap_err();
    assert!(matches!(err, ReconcileError::MissingSnapshot { operation: "add", .. }));
    assert!(h.scene.is_empty());
}

#[test]
fn unknown_shape_leaves_scene_untouched() {
    let mut h = Harness::new();
    let err = h.apply(&update(Operation::Add, "x", Some(json!({"type": "blob"})))).unwrap_err();
    assert!(matches!(err, ReconcileError::UnknownType { .. }));
    assert!(h.scene.is_empty());
    assert!(h.scene.take_events().is_empty());
    assert!(h.echo.is_empty());
}

// =============================================================
// modify
// =============================================================

#[test]
fn modify_of_absent_object_acts_as_add() {
    let mut h = Harness::new();
    let applied = h.apply(&update(Operation::Modify, "r1", Some(rect_snapshot(5.0, "#fff")))).unwrap();
    assert_eq!(applied, Applied::Inserted("r1".into()));
    assert_eq!(h.scene.len(), 1);
}

#[test]
fn modify_copies_attributes_in_place_and_refreshes_bounds() {
    let mut h = Harness::new();
    h.apply(&update(Operation::Add, "r1", Some(rect_snapshot(0.0, "#000")))).unwrap();
    h.scene.take_events();

    let applied = h.apply(&update(Operation::Modify, "r1", Some(rect_snapshot(75.0, "#abc")))).unwrap();
    assert_eq!(applied, Applied::Updated("r1".into()));

    let object = h.scene.get("r1").unwrap();
    assert_eq!(object.id, "r1");
    assert_eq!(object.placement.left, 75.0);
    assert_eq!(object.style.fill.as_deref(), Some("#abc"));
    assert_eq!(h.scene.bounds("r1").unwrap().left, 75.0);
    assert_eq!(h.scene.take_events(), vec![SceneEvent::Modified("r1".into())]);
}

#[test]
fn modify_of_selected_object_is_deferred() {
    let mut h = Harness::new();
    h.apply(&update(Operation::Add, "r1", Some(rect_snapshot(0.0, "#000")))).unwrap();
    h.scene.select(&["r1"]);
    h.scene.take_events();

    let applied = h.apply(&update(Operation::Modify, "r1", Some(rect_snapshot(99.0, "#f00")))).unwrap();
    assert_eq!(applied, Applied::Deferred("r1".into()));
    assert_eq!(h.reconciler.state("r1"), SyncState::RemotePending);

    let object = h.scene.get("r1").unwrap();
    assert_eq!(object.placement.left, 0.0);
    assert_eq!(object.style.fill.as_deref(), Some("#000"));
    assert!(h.scene.take_events().is_empty());

    h.reconciler.mark_emitted("r1");
    assert_eq!(h.reconciler.state("r1"), SyncState::Synced);
}

#[test]
fn last_applied_modify_wins() {
    let mut h = Harness::new();
    h.apply(&update(Operation::Add, "r1", Some(rect_snapshot(0.0, "#000")))).unwrap();
    h.apply(&update(Operation::Modify, "r1", Some(rect_snapshot(1.0, "#111")))).unwrap();
    h.apply(&update(Operation::Modify, "r1", Some(rect_snapshot(2.0, "#222")))).unwrap();
    assert_eq!(h.scene.get("r1").unwrap().style.fill.as_deref(), Some("#222"));
}

// =============================================================
// delete
// =============================================================

#[test]
fn delete_removes_and_resets_state() {
    let mut h = Harness::new();
    h.apply(&update(Operation::Add, "r1", Some(rect_snapshot(0.0, "#000")))).unwrap();
    let applied = h.apply(&update(Operation::Delete, "r1", None)).unwrap();

    assert_eq!(applied, Applied::Removed("r1".into()));
    assert!(h.scene.get("r1").is_none());
    assert_eq!(h.reconciler.state("r1"), SyncState::Unknown);
    assert_eq!(h.echo.remote_origin("r1", h.now), Some("conn-b"));
}

#[test]
fn delete_of_absent_object_is_noop() {
    let mut h = Harness::new();
    let applied = h.apply(&update(Operation::Delete, "ghost", None)).unwrap();
    assert_eq!(applied, Applied::Ignored("ghost".into()));
    assert!(!applied.changed_scene());
    assert!(h.echo.is_empty());
}

// =============================================================
// local transitions
// =============================================================

#[test]
fn local_lifecycle_states() {
    let mut reconciler = Reconciler::new();
    assert_eq!(reconciler.state("o"), SyncState::Unknown);
    reconciler.mark_local("o");
    assert_eq!(reconciler.state("o"), SyncState::LocalOnly);
    reconciler.mark_emitted("o");
    assert_eq!(reconciler.state("o"), SyncState::Synced);
    reconciler.forget("o");
    assert_eq!(reconciler.state("o"), SyncState::Unknown);
}
