use serde_json::json;

use super::*;

#[test]
fn participant_uses_wire_names() {
    let participant = Participant {
        connection_id: "c1".into(),
        user_id: "u1".into(),
        display_name: "Ada".into(),
        color: "#ff0000".into(),
        pointer: Point::new(1.0, 2.0),
        active_object_id: None,
    };

    let value = serde_json::to_value(&participant).expect("json");
    assert_eq!(
        value,
        json!({
            "connectionId": "c1",
            "userId": "u1",
            "username": "Ada",
            "userColor": "#ff0000",
            "mousePosition": {"x": 1.0, "y": 2.0}
        })
    );
}

#[test]
fn participant_pointer_defaults_to_origin() {
    let participant: Participant = serde_json::from_value(json!({
        "connectionId": "c1", "userId": "u1", "username": "Ada", "userColor": "#000"
    }))
    .expect("participant");
    assert_eq!(participant.pointer, Point::default());
}

#[test]
fn remove_is_accepted_as_delete() {
    let op: Operation = serde_json::from_value(json!("remove")).expect("op");
    assert_eq!(op, Operation::Delete);
    assert_eq!(serde_json::to_value(op).expect("json"), json!("delete"));
}

#[test]
fn unknown_operation_is_rejected() {
    let frame = crate::Frame::request(
        CANVAS_UPDATE,
        json!({"roomId": "r", "operation": "rotate", "objectId": "o"}),
    );
    let err = decode_payload::<CanvasUpdate>(&frame).expect_err("should fail");
    assert!(matches!(err, ProtocolError::InvalidPayload { ref event, .. } if event == CANVAS_UPDATE));
}

#[test]
fn add_without_snapshot_is_malformed() {
    let update = CanvasUpdate::new("r", Operation::Add, "o", None);
    assert!(matches!(update.validate(), Err(ProtocolError::MissingField("object"))));

    let null_snapshot = CanvasUpdate::new("r", Operation::Modify, "o", Some(Value::Null));
    assert!(null_snapshot.validate().is_err());
}

#[test]
fn delete_needs_no_snapshot() {
    let update = CanvasUpdate::new("r", Operation::Delete, "o", None);
    assert!(update.validate().is_ok());
}

#[test]
fn blank_object_id_is_malformed() {
    let update = CanvasUpdate::new("r", Operation::Delete, "  ", None);
    assert!(matches!(update.validate(), Err(ProtocolError::MissingField("objectId"))));
}

#[test]
fn canvas_update_omits_unset_server_fields() {
    let update = CanvasUpdate::new("r", Operation::Delete, "o", None);
    let value = serde_json::to_value(&update).expect("json");
    assert_eq!(value, json!({"roomId": "r", "operation": "delete", "objectId": "o"}));
}

#[test]
fn join_requires_identity_fields() {
    let join = JoinCanvas {
        room_id: "r".into(),
        user_id: String::new(),
        username: "Ada".into(),
        user_color: None,
    };
    assert!(matches!(join.validate(), Err(ProtocolError::MissingField("userId"))));
}

#[test]
fn join_color_is_optional_on_the_wire() {
    let frame = crate::Frame::request(JOIN_CANVAS, json!({"roomId": "r", "userId": "u", "username": "Ada"}));
    let join: JoinCanvas = decode_payload(&frame).expect("join");
    assert!(join.user_color.is_none());
    assert!(join.validate().is_ok());
}
