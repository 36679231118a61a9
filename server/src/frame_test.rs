use axum::body::Bytes;
use frames::protocol::CANVAS_UPDATE;
use serde_json::json;

use super::*;

#[test]
fn binary_message_decodes() {
    let frame = Frame::request(CANVAS_UPDATE, json!({"objectId": "r1"})).with_room_id("p1");
    let message = encode_outbound(&frame);
    assert!(matches!(message, Message::Binary(_)));

    let parsed = parse_inbound(&message).unwrap().unwrap();
    assert_eq!(parsed, frame);
}

#[test]
fn text_message_decodes() {
    let frame = Frame::request("mouse-move", json!({"roomId": "p1", "position": {"x": 1.0, "y": 2.0}}));
    let text = serde_json::to_string(&frame).unwrap();

    let parsed = parse_inbound(&Message::Text(text.into())).unwrap().unwrap();
    assert_eq!(parsed.syscall, "mouse-move");
    assert_eq!(parsed.data["position"]["x"], 1.0);
}

#[test]
fn control_messages_are_skipped() {
    assert!(parse_inbound(&Message::Ping(Bytes::new())).unwrap().is_none());
    assert!(parse_inbound(&Message::Close(None)).unwrap().is_none());
}

#[test]
fn garbage_is_an_error_with_code() {
    let err = parse_inbound(&Message::Text("{not json".into())).unwrap_err();
    assert_eq!(err.error_code(), "E_FRAME_JSON");

    let err = parse_inbound(&Message::Binary(Bytes::from_static(&[0xff, 0xff, 0xff]))).unwrap_err();
    assert_eq!(err.error_code(), "E_FRAME_DECODE");
}

#[test]
fn protocol_errors_have_codes() {
    assert_eq!(frames::ProtocolError::MissingField("roomId").error_code(), "E_MISSING_FIELD");
    let source = serde_json::from_str::<u32>("\"x\"").unwrap_err();
    let err = frames::ProtocolError::InvalidPayload { event: CANVAS_UPDATE.into(), source };
    assert_eq!(err.error_code(), "E_INVALID_PAYLOAD");
}
