use std::time::{Duration, Instant};

use super::*;

const GRACE: Duration = Duration::from_millis(300);

#[test]
fn remote_tag_reports_sender_within_grace() {
    let mut guard = EchoGuard::new(GRACE);
    let t0 = Instant::now();
    guard.mark_remote("r1", "conn-b", t0);

    assert_eq!(guard.remote_origin("r1", t0), Some("conn-b"));
    assert_eq!(guard.remote_origin("r1", t0 + Duration::from_millis(299)), Some("conn-b"));
    assert_eq!(guard.remote_origin("r1", t0 + GRACE), None);
    assert_eq!(guard.remote_origin("other", t0), None);
}

#[test]
fn retagging_restarts_window() {
    let mut guard = EchoGuard::new(GRACE);
    let t0 = Instant::now();
    guard.mark_remote("r1", "conn-b", t0);
    guard.mark_remote("r1", "conn-c", t0 + Duration::from_millis(200));

    assert_eq!(guard.remote_origin("r1", t0 + Duration::from_millis(400)), Some("conn-c"));
}

#[test]
fn sweep_returns_expired_remote_ids() {
    let mut guard = EchoGuard::new(GRACE);
    let t0 = Instant::now();
    guard.mark_remote("b", "x", t0);
    guard.mark_remote("a", "x", t0);
    guard.mark_remote("late", "x", t0 + Duration::from_millis(250));
    guard.mark_pending("mine", t0);

    let expired = guard.sweep(t0 + GRACE);
    assert_eq!(expired, vec!["a".to_owned(), "b".to_owned()]);
    assert_eq!(guard.len(), 1);
    assert!(!guard.is_pending("mine", t0 + GRACE));
}

#[test]
fn pending_expires_after_grace() {
    let mut guard = EchoGuard::new(GRACE);
    let t0 = Instant::now();
    guard.mark_pending("o", t0);
    assert!(guard.is_pending("o", t0 + Duration::from_millis(10)));
    assert!(!guard.is_pending("o", t0 + GRACE));
}

#[test]
fn settle_drops_remote_tag_but_keeps_pending() {
    let mut guard = EchoGuard::new(GRACE);
    let t0 = Instant::now();
    guard.mark_remote("r1", "conn-b", t0);
    guard.mark_pending("r1", t0);

    guard.settle("r1");
    assert_eq!(guard.remote_origin("r1", t0), None);
    assert!(guard.is_pending("r1", t0));
}

#[test]
fn forget_and_clear_drop_tags() {
    let mut guard = EchoGuard::default();
    let t0 = Instant::now();
    guard.mark_remote("a", "x", t0);
    guard.mark_pending("a", t0);
    guard.mark_remote("b", "x", t0);

    guard.forget("a");
    assert_eq!(guard.remote_origin("a", t0), None);
    assert!(!guard.is_pending("a", t0));
    assert_eq!(guard.len(), 1);

    guard.clear();
    assert!(guard.is_empty());
}
