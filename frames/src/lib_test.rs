use super::*;

fn canvas_update_frame() -> Frame {
    Frame {
        id: "frame-1".to_owned(),
        parent_id: None,
        ts: 1_700_000_000_000,
        room_id: Some("project-7".to_owned()),
        from: Some("conn-a".to_owned()),
        syscall: protocol::CANVAS_UPDATE.to_owned(),
        status: Status::Request,
        data: serde_json::json!({
            "roomId": "project-7",
            "operation": "modify",
            "objectId": "obj_1_abcdefghi",
            "object": {"type": "rectangle", "left": 10.5, "fill": "#3498db", "visible": true},
            "senderId": "conn-a",
            "nil": null
        }),
    }
}

#[test]
fn canvas_update_survives_protobuf_transport() {
    let frame = canvas_update_frame();
    let decoded = decode_frame(&encode_frame(&frame)).expect("decode should succeed");
    assert_eq!(decoded, frame);

    let update: CanvasUpdate = protocol::decode_payload(&decoded).expect("payload");
    assert_eq!(update.operation, Operation::Modify);
    assert_eq!(update.sender_id.as_deref(), Some("conn-a"));
}

#[test]
fn decode_frame_rejects_malformed_bytes() {
    let err = decode_frame(&[0xff, 0x00, 0x01]).expect_err("bytes should fail");
    assert!(matches!(err, CodecError::Decode(_)));
}

#[test]
fn event_serializes_typed_payload() {
    let frame = Frame::event(protocol::USER_LEFT, &UserLeft { connection_id: "c1".into() });
    assert_eq!(frame.syscall, "user-left");
    assert_eq!(frame.status, Status::Request);
    assert_eq!(frame.data, serde_json::json!({"connectionId": "c1"}));
    assert!(frame.parent_id.is_none());
}

#[test]
fn reply_links_parent_and_copies_room() {
    let join = Frame::request(protocol::JOIN_CANVAS, serde_json::json!({})).with_room_id("room-1");
    let reply = join.reply(protocol::ACTIVE_USERS, &ActiveUsers { users: Vec::new() });

    assert_eq!(reply.parent_id.as_deref(), Some(join.id.as_str()));
    assert_eq!(reply.room_id.as_deref(), Some("room-1"));
    assert_eq!(reply.status, Status::Done);
    assert_ne!(reply.id, join.id);
    assert_eq!(reply.data, serde_json::json!({"users": []}));
}

#[test]
fn builders_set_routing_fields() {
    let frame = Frame::request("x", Value::Null).with_room_id("r").with_from("c");
    assert_eq!(frame.room_id.as_deref(), Some("r"));
    assert_eq!(frame.from.as_deref(), Some("c"));
    assert!(frame.ts > 0);
}

#[test]
fn frame_json_form_uses_lowercase_status() {
    let frame = Frame::request("x", Value::Null);
    let json = serde_json::to_value(&frame).expect("json");
    assert_eq!(json["status"], "request");
}
