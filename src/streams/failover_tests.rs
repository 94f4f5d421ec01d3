//! Tests for stream failover rotation

use super::*;
use crate::streams::{PlaybackTechnology, StreamDescriptor};

fn catalog(ids: &[&str], primary: Option<&str>) -> StreamCatalog {
    let streams = ids
        .iter()
        .map(|id| {
            StreamDescriptor::new(
                *id,
                format!("Stream {}", id),
                format!("https://example.com/{}.m3u8", id),
                PlaybackTechnology::AdaptiveStreaming,
            )
            .with_primary(Some(*id) == primary)
        })
        .collect();
    StreamCatalog::new(streams).unwrap()
}

fn current_id(controller: &FailoverController) -> Option<String> {
    controller.current().map(|s| s.id().to_string())
}

fn id(s: &str) -> StreamId {
    StreamId::from(s)
}

#[test]
fn test_starts_on_primary() {
    let controller = FailoverController::new(catalog(&["a", "b", "c"], Some("b")));
    assert_eq!(current_id(&controller).as_deref(), Some("b"));
    assert!(controller.failed().is_empty());
}

#[test]
fn test_starts_on_first_without_primary() {
    let controller = FailoverController::new(catalog(&["a", "b"], None));
    assert_eq!(current_id(&controller).as_deref(), Some("a"));
}

#[test]
fn test_three_stream_rotation_to_all_failed() {
    let mut controller = FailoverController::new(catalog(&["S1", "S2", "S3"], Some("S1")));

    assert_eq!(
        controller.on_stream_failure(&id("S1")),
        FailoverOutcome::Switched { from: id("S1"), to: id("S2") }
    );
    assert_eq!(current_id(&controller).as_deref(), Some("S2"));

    assert_eq!(
        controller.on_stream_failure(&id("S2")),
        FailoverOutcome::Switched { from: id("S2"), to: id("S3") }
    );
    assert_eq!(current_id(&controller).as_deref(), Some("S3"));

    assert_eq!(controller.on_stream_failure(&id("S3")), FailoverOutcome::AllFailed);
    assert_eq!(controller.state(), FailoverState::AllFailed);
    assert!(controller.current().is_none());

    let failed: Vec<&str> = controller.failed().iter().map(|s| s.as_str()).collect();
    assert_eq!(failed, vec!["S1", "S2", "S3"]);
}

#[test]
fn test_duplicate_failure_switches_once() {
    let mut controller = FailoverController::new(catalog(&["S1", "S2"], Some("S1")));

    assert_eq!(
        controller.on_stream_failure(&id("S1")),
        FailoverOutcome::Switched { from: id("S1"), to: id("S2") }
    );
    assert_eq!(controller.on_stream_failure(&id("S1")), FailoverOutcome::AlreadyFailed);

    assert_eq!(current_id(&controller).as_deref(), Some("S2"));
    assert_eq!(controller.failed().len(), 1);
    assert!(controller.is_failed(&id("S1")));
    assert!(!controller.is_failed(&id("S2")));
}

#[test]
fn test_repeated_failure_is_idempotent() {
    let mut once = FailoverController::new(catalog(&["a", "b", "c", "d"], Some("b")));
    let mut twice = once.clone();

    once.on_stream_failure(&id("b"));
    twice.on_stream_failure(&id("b"));
    twice.on_stream_failure(&id("b"));

    assert_eq!(current_id(&once), current_id(&twice));
    assert_eq!(once.failed(), twice.failed());
    assert_eq!(once.is_all_failed(), twice.is_all_failed());
}

#[test]
fn test_rotation_visits_every_other_stream_in_order() {
    let ids = ["a", "b", "c", "d", "e"];
    for start in 0..ids.len() {
        let mut controller = FailoverController::new(catalog(&ids, Some(ids[start])));
        let mut visited = Vec::new();

        for _ in 0..ids.len() - 1 {
            let failing = controller.current().unwrap().id().clone();
            match controller.on_stream_failure(&failing) {
                FailoverOutcome::Switched { to, .. } => visited.push(to.to_string()),
                other => panic!("unexpected outcome {:?}", other),
            }
        }

        let expected: Vec<String> = (1..ids.len())
            .map(|step| ids[(start + step) % ids.len()].to_string())
            .collect();
        assert_eq!(visited, expected, "rotation starting at {}", ids[start]);

        let last = controller.current().unwrap().id().clone();
        assert_eq!(controller.on_stream_failure(&last), FailoverOutcome::AllFailed);
    }
}

#[test]
fn test_rotation_skips_already_failed_streams() {
    let mut controller = FailoverController::new(catalog(&["a", "b", "c", "d"], Some("a")));
    // "c" fails out of band (e.g. a stale report) while "a" is on screen
    controller.on_stream_failure(&id("c"));
    assert_eq!(current_id(&controller).as_deref(), Some("d"));

    controller.on_stream_failure(&id("d"));
    assert_eq!(current_id(&controller).as_deref(), Some("a"));

    controller.on_stream_failure(&id("a"));
    assert_eq!(current_id(&controller).as_deref(), Some("b"));
}

#[test]
fn test_single_stream_catalog_goes_straight_to_all_failed() {
    let mut controller = FailoverController::new(catalog(&["only"], None));
    assert_eq!(controller.on_stream_failure(&id("only")), FailoverOutcome::AllFailed);
    assert!(controller.is_all_failed());
}

#[test]
fn test_failures_after_all_failed_are_noops() {
    let mut controller = FailoverController::new(catalog(&["a", "b"], None));
    controller.on_stream_failure(&id("a"));
    controller.on_stream_failure(&id("b"));
    assert_eq!(controller.on_stream_failure(&id("a")), FailoverOutcome::AlreadyFailed);
    assert_eq!(controller.on_stream_failure(&id("b")), FailoverOutcome::AlreadyFailed);
    assert_eq!(controller.state(), FailoverState::AllFailed);
}

#[test]
fn test_unknown_stream_is_recorded_without_switching() {
    let mut controller = FailoverController::new(catalog(&["a", "b"], None));
    assert_eq!(controller.on_stream_failure(&id("ghost")), FailoverOutcome::UnknownStream);
    assert_eq!(current_id(&controller).as_deref(), Some("a"));
    assert!(controller.is_failed(&id("ghost")));
    assert_eq!(controller.on_stream_failure(&id("ghost")), FailoverOutcome::AlreadyFailed);
}

#[test]
fn test_manual_select() {
    let mut controller = FailoverController::new(catalog(&["a", "b", "c"], None));
    assert!(controller.select(&id("c")));
    assert_eq!(current_id(&controller).as_deref(), Some("c"));

    controller.on_stream_failure(&id("c"));
    assert_eq!(current_id(&controller).as_deref(), Some("a"));

    // Failed streams stay off-limits for the rest of the session
    assert!(!controller.select(&id("c")));
    assert!(!controller.select(&id("missing")));
    assert_eq!(current_id(&controller).as_deref(), Some("a"));
}

#[test]
fn test_manual_select_refused_after_all_failed() {
    let mut controller = FailoverController::new(catalog(&["a"], None));
    controller.on_stream_failure(&id("a"));
    assert!(!controller.select(&id("a")));
    assert!(controller.current().is_none());
}
