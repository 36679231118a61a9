use serde_json::json;

use super::*;

#[test]
fn empty_json_object_takes_project_defaults() {
    let doc: ProjectDocument = serde_json::from_value(json!({})).expect("doc");
    assert_eq!(doc, ProjectDocument::default());
    assert_eq!(doc.background_color, "#f8f9fa");
    assert!((doc.width - 1400.0).abs() < f64::EPSILON);
    assert!((doc.height - 600.0).abs() < f64::EPSILON);
}

#[test]
fn keys_are_camel_case() {
    let doc = ProjectDocument { last_edited: 5, ..ProjectDocument::default() };
    let value = serde_json::to_value(&doc).expect("json");
    assert_eq!(value["lastEdited"], 5);
    assert_eq!(value["backgroundColor"], "#f8f9fa");
    assert!(value.get("canvasData").is_some());
}

#[test]
fn object_ids_skip_snapshots_without_id() {
    let doc = ProjectDocument::with_objects(vec![
        json!({"type": "rectangle", "id": "a"}),
        json!({"type": "ellipse"}),
        json!({"type": "text", "id": "b"}),
    ]);
    assert_eq!(doc.object_ids().collect::<Vec<_>>(), vec!["a", "b"]);
    assert!(doc.last_edited > 0);
}
