use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::{Duration, timeout};

use super::*;
use crate::services::presence::ParticipantInfo;

fn info(user: &str) -> ParticipantInfo {
    ParticipantInfo { user_id: user.into(), display_name: user.into(), color: "#000000".into() }
}

async fn member(
    presence: &PresenceRegistry,
    room: &str,
    capacity: usize,
) -> (Uuid, mpsc::Receiver<Frame>) {
    let id = Uuid::new_v4();
    let (tx, rx) = mpsc::channel::<Frame>(capacity);
    presence.join(room, id, info(&id.to_string()), tx).await;
    (id, rx)
}

async fn assert_no_frame(rx: &mut mpsc::Receiver<Frame>) {
    assert!(timeout(Duration::from_millis(50), rx.recv()).await.is_err(), "expected no frame");
}

#[tokio::test]
async fn route_excludes_sender() {
    let presence = PresenceRegistry::new();
    let router = BroadcastRouter::new(presence.clone());
    let (a, mut rx_a) = member(&presence, "p1", 8).await;
    let (_b, mut rx_b) = member(&presence, "p1", 8).await;
    let (_c, mut rx_c) = member(&presence, "p1", 8).await;

    let frame = Frame::request("canvas-update", json!({"objectId": "r1"}));
    assert_eq!(router.route("p1", a, &frame).await, 2);

    assert_eq!(rx_b.recv().await.unwrap().id, frame.id);
    assert_eq!(rx_c.recv().await.unwrap().id, frame.id);
    assert_no_frame(&mut rx_a).await;
}

#[tokio::test]
async fn route_stays_inside_room() {
    let presence = PresenceRegistry::new();
    let router = BroadcastRouter::new(presence.clone());
    let (a, _rx_a) = member(&presence, "p1", 8).await;
    let (_other, mut rx_other) = member(&presence, "p2", 8).await;

    let frame = Frame::request("canvas-update", json!({}));
    assert_eq!(router.route("p1", a, &frame).await, 0);
    assert_no_frame(&mut rx_other).await;
}

#[tokio::test]
async fn notify_includes_everyone() {
    let presence = PresenceRegistry::new();
    let router = BroadcastRouter::new(presence.clone());
    let (_a, mut rx_a) = member(&presence, "p1", 8).await;
    let (_b, mut rx_b) = member(&presence, "p1", 8).await;

    let frame = Frame::request("notice", json!({}));
    assert_eq!(router.notify("p1", &frame).await, 2);
    assert!(rx_a.recv().await.is_some());
    assert!(rx_b.recv().await.is_some());
}

#[tokio::test]
async fn full_channel_drops_for_that_recipient_only() {
    let presence = PresenceRegistry::new();
    let router = BroadcastRouter::new(presence.clone());
    let (a, _rx_a) = member(&presence, "p1", 8).await;
    let (_slow, mut rx_slow) = member(&presence, "p1", 1).await;
    let (_fast, mut rx_fast) = member(&presence, "p1", 8).await;

    let first = Frame::request("canvas-update", json!({"n": 1}));
    let second = Frame::request("canvas-update", json!({"n": 2}));
    assert_eq!(router.route("p1", a, &first).await, 2);
    assert_eq!(router.route("p1", a, &second).await, 1);

    assert_eq!(rx_slow.recv().await.unwrap().id, first.id);
    assert_no_frame(&mut rx_slow).await;
    assert_eq!(rx_fast.recv().await.unwrap().id, first.id);
    assert_eq!(rx_fast.recv().await.unwrap().id, second.id);
}

#[tokio::test]
async fn closed_channel_is_skipped() {
    let presence = PresenceRegistry::new();
    let router = BroadcastRouter::new(presence.clone());
    let (a, _rx_a) = member(&presence, "p1", 8).await;
    let (_gone, rx_gone) = member(&presence, "p1", 8).await;
    drop(rx_gone);

    assert_eq!(router.route("p1", a, &Frame::request("x", json!({}))).await, 0);
}

#[tokio::test]
async fn per_sender_order_is_preserved() {
    let presence = PresenceRegistry::new();
    let router = BroadcastRouter::new(presence.clone());
    let (a, _rx_a) = member(&presence, "p1", 64).await;
    let (_b, mut rx_b) = member(&presence, "p1", 64).await;

    for n in 0..20 {
        router.route("p1", a, &Frame::request("canvas-update", json!({"n": n}))).await;
    }
    for n in 0..20 {
        assert_eq!(rx_b.recv().await.unwrap().data["n"], n);
    }
}

#[tokio::test]
async fn unknown_room_delivers_nothing() {
    let router = BroadcastRouter::new(PresenceRegistry::new());
    assert_eq!(router.notify("nope", &Frame::request("x", json!({}))).await, 0);
}
