#![allow(clippy::float_cmp)]

use crate::object::{Placement, Shape, Style};

use super::*;

fn square(side: f64) -> SyncedObject {
    SyncedObject::new(
        Shape::Rectangle { width: side, height: side, rx: 0.0, ry: 0.0 },
        Placement::default(),
        Style::default(),
    )
}

#[test]
fn add_local_assigns_id_and_raises_added() {
    let mut scene = SceneStore::new();
    let id = scene.add_local(square(10.0));

    assert!(id.starts_with("obj_"));
    assert_eq!(scene.get(&id).unwrap().id, id);
    assert_eq!(scene.take_events(), vec![SceneEvent::Added(id)]);
    assert!(scene.take_events().is_empty());
}

#[test]
fn insert_with_existing_id_replaces_without_duplicating() {
    let mut scene = SceneStore::new();
    let mut a = square(10.0);
    a.id = "r1".into();
    let mut b = square(20.0);
    b.id = "r1".into();

    scene.insert(a);
    scene.insert(b);
    assert_eq!(scene.len(), 1);
    assert_eq!(scene.objects().len(), 1);
    assert_eq!(scene.bounds("r1").unwrap().width, 20.0);
}

#[test]
fn update_refreshes_cached_bounds() {
    let mut scene = SceneStore::new();
    let id = scene.add_local(square(10.0));
    scene.take_events();

    let mut moved = square(10.0);
    moved.placement.left = 100.0;
    assert!(scene.update(&id, moved));
    assert_eq!(scene.bounds(&id).unwrap().left, 100.0);
    assert_eq!(scene.take_events(), vec![SceneEvent::Modified(id)]);
    assert!(!scene.update("missing", square(1.0)));
}

#[test]
fn modify_local_edits_in_place() {
    let mut scene = SceneStore::new();
    let id = scene.add_local(square(10.0));
    scene.take_events();

    assert!(scene.modify_local(&id, |o| o.placement.top = 7.0));
    assert_eq!(scene.get(&id).unwrap().placement.top, 7.0);
    assert_eq!(scene.bounds(&id).unwrap().top, 7.0);
    assert_eq!(scene.take_events(), vec![SceneEvent::Modified(id)]);
}

#[test]
fn remove_clears_selection_and_order() {
    let mut scene = SceneStore::new();
    let a = scene.add_local(square(1.0));
    let b = scene.add_local(square(2.0));
    scene.select(&[a.as_str(), b.as_str()]);
    scene.take_events();

    assert!(scene.remove(&a).is_some());
    assert_eq!(scene.selection(), &[b.clone()]);
    assert!(!scene.is_actively_edited(&a));
    assert!(scene.is_actively_edited(&b));
    assert_eq!(scene.objects().len(), 1);
    assert_eq!(scene.take_events(), vec![SceneEvent::Removed(a.clone())]);
    assert!(scene.remove(&a).is_none());
}

#[test]
fn objects_keep_insertion_order() {
    let mut scene = SceneStore::new();
    let ids: Vec<ObjectId> = (0..3).map(|i| scene.add_local(square(f64::from(i)))).collect();
    let listed: Vec<&str> = scene.objects().into_iter().map(|o| o.id.as_str()).collect();
    assert_eq!(listed, ids.iter().map(String::as_str).collect::<Vec<_>>());
}

#[test]
fn transforming_group_selection_raises_one_event() {
    let mut scene = SceneStore::new();
    let a = scene.add_local(square(1.0));
    let b = scene.add_local(square(1.0));
    scene.select(&[a.as_str(), b.as_str(), "ghost"]);
    scene.take_events();

    scene.transform_selection(|o| o.placement.left += 5.0);
    assert_eq!(scene.get(&a).unwrap().placement.left, 5.0);
    assert_eq!(scene.get(&b).unwrap().placement.left, 5.0);
    assert_eq!(scene.take_events(), vec![SceneEvent::SelectionModified(vec![a, b])]);
}

#[test]
fn transforming_single_selection_is_plain_modify() {
    let mut scene = SceneStore::new();
    let a = scene.add_local(square(1.0));
    scene.select(&[a.as_str()]);
    scene.take_events();

    scene.transform_selection(|o| o.placement.left = 1.0);
    assert_eq!(scene.take_events(), vec![SceneEvent::Modified(a)]);

    scene.clear_selection();
    scene.transform_selection(|o| o.placement.left = 2.0);
    assert!(scene.take_events().is_empty());
}
