//! Tests for the playback adapter, driven by a scripted engine

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::mpsc::Sender;

use super::*;
use crate::streams::StreamCatalog;

#[derive(Clone, Default)]
struct FakeEngine {
    log: Rc<RefCell<Vec<String>>>,
    senders: Rc<RefCell<Vec<Sender<EngineEvent>>>>,
}

impl FakeEngine {
    fn send(&self, event: EngineEvent) {
        let senders = self.senders.borrow();
        let _ = senders.last().unwrap().send(event);
    }

    fn send_to(&self, session: usize, event: EngineEvent) {
        let _ = self.senders.borrow()[session].send(event);
    }

    fn log(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}

struct FakeSession {
    locator: String,
    log: Rc<RefCell<Vec<String>>>,
}

impl EngineSession for FakeSession {
    fn resume(&mut self) {
        self.log.borrow_mut().push(format!("resume {}", self.locator));
    }

    fn stop(&mut self) {
        self.log.borrow_mut().push(format!("stop {}", self.locator));
    }

    fn take_frame(&self) -> Option<DecodedFrame> {
        None
    }
}

impl AdaptiveEngine for FakeEngine {
    fn start(
        &mut self,
        locator: &str,
        _options: &SessionOptions,
        events: Sender<EngineEvent>,
    ) -> Box<dyn EngineSession> {
        self.log.borrow_mut().push(format!("start {}", locator));
        self.senders.borrow_mut().push(events);
        Box::new(FakeSession {
            locator: locator.to_string(),
            log: Rc::clone(&self.log),
        })
    }
}

fn hls(id: &str) -> StreamDescriptor {
    StreamDescriptor::new(
        id,
        id.to_uppercase(),
        format!("https://example.com/{}.m3u8", id),
        PlaybackTechnology::AdaptiveStreaming,
    )
}

fn embedded(id: &str, src: &str) -> StreamDescriptor {
    StreamDescriptor::new(id, id.to_uppercase(), src, PlaybackTechnology::EmbeddedPlayer)
}

fn fatal(kind: FaultKind) -> EngineEvent {
    EngineEvent::Fatal(PlaybackFault::new(kind, "boom"))
}

fn adapter(engine: &FakeEngine) -> PlaybackAdapter<FakeEngine> {
    PlaybackAdapter::new(engine.clone(), SessionOptions::default())
}

fn collect_errors(adapter: &mut PlaybackAdapter<FakeEngine>) -> Vec<String> {
    let mut errors = Vec::new();
    adapter.poll(|id| errors.push(id.to_string()));
    errors
}

#[test]
fn test_fatal_reported_once_per_activation() {
    let engine = FakeEngine::default();
    let mut adapter = adapter(&engine);
    adapter.activate(&hls("s1"));

    engine.send(fatal(FaultKind::Transport));
    engine.send(fatal(FaultKind::Media));
    assert_eq!(collect_errors(&mut adapter), vec!["s1"]);

    engine.send(fatal(FaultKind::Unknown));
    assert!(collect_errors(&mut adapter).is_empty());
    assert_eq!(
        adapter.status(),
        Some(&SurfaceStatus::Failed(FaultKind::Unknown.message().to_string()))
    );
}

#[test]
fn test_switch_tears_down_before_starting() {
    let engine = FakeEngine::default();
    let mut adapter = adapter(&engine);
    adapter.activate(&hls("s1"));
    adapter.activate(&hls("s2"));

    assert_eq!(
        engine.log(),
        vec![
            "start https://example.com/s1.m3u8",
            "stop https://example.com/s1.m3u8",
            "start https://example.com/s2.m3u8",
        ]
    );
    assert_eq!(adapter.current().unwrap().id().as_str(), "s2");
}

#[test]
fn test_superseded_session_cannot_report() {
    let engine = FakeEngine::default();
    let mut adapter = adapter(&engine);
    adapter.activate(&hls("s1"));
    adapter.activate(&hls("s2"));

    engine.send_to(0, fatal(FaultKind::Transport));
    assert!(collect_errors(&mut adapter).is_empty());

    engine.send_to(1, fatal(FaultKind::Media));
    assert_eq!(collect_errors(&mut adapter), vec!["s2"]);
}

#[test]
fn test_new_activation_reports_again() {
    let engine = FakeEngine::default();
    let mut adapter = adapter(&engine);
    adapter.activate(&hls("s1"));
    engine.send(fatal(FaultKind::Transport));
    assert_eq!(collect_errors(&mut adapter), vec!["s1"]);

    adapter.activate(&hls("s2"));
    engine.send(fatal(FaultKind::Transport));
    assert_eq!(collect_errors(&mut adapter), vec!["s2"]);
}

#[test]
fn test_same_descriptor_is_not_restarted() {
    let engine = FakeEngine::default();
    let mut adapter = adapter(&engine);
    let stream = hls("s1");
    adapter.activate(&stream);
    adapter.activate(&stream.clone().with_primary(true));

    assert_eq!(engine.log(), vec!["start https://example.com/s1.m3u8"]);
}

#[test]
fn test_autoplay_blocked_is_not_a_failure() {
    let engine = FakeEngine::default();
    let mut adapter = adapter(&engine);
    adapter.activate(&hls("s1"));

    engine.send(EngineEvent::Attached);
    engine.send(EngineEvent::AutoplayBlocked);
    assert!(collect_errors(&mut adapter).is_empty());
    assert_eq!(adapter.status(), Some(&SurfaceStatus::ClickToPlay));

    adapter.click_to_play();
    assert_eq!(adapter.status(), Some(&SurfaceStatus::Connecting));
    assert!(engine.log().contains(&"resume https://example.com/s1.m3u8".to_string()));

    engine.send(EngineEvent::Playing);
    collect_errors(&mut adapter);
    assert_eq!(adapter.status(), Some(&SurfaceStatus::Playing));
}

#[test]
fn test_recoverable_and_unavailable_are_not_reported() {
    let engine = FakeEngine::default();
    let mut adapter = adapter(&engine);
    adapter.activate(&hls("s1"));

    engine.send(EngineEvent::Recovered("buffer stall".to_string()));
    engine.send(EngineEvent::Unavailable("no decoder".to_string()));
    assert!(collect_errors(&mut adapter).is_empty());
    assert_eq!(
        adapter.status(),
        Some(&SurfaceStatus::Unavailable("no decoder".to_string()))
    );
}

#[test]
fn test_embedded_stream_has_no_session() {
    let engine = FakeEngine::default();
    let mut adapter = adapter(&engine);
    adapter.activate(&embedded("cam", "https://player.example/embed/x?autoplay=1&mute=1"));

    assert!(engine.log().is_empty());
    assert!(collect_errors(&mut adapter).is_empty());
    assert_eq!(
        adapter.embedded_source().as_deref(),
        Some("https://player.example/embed/x?autoplay=1&mute=1")
    );

    adapter.set_volume(0.5);
    assert_eq!(
        adapter.embedded_source().as_deref(),
        Some("https://player.example/embed/x?autoplay=1&mute=0")
    );
}

#[test]
fn test_switch_from_adaptive_to_embedded_stops_session() {
    let engine = FakeEngine::default();
    let mut adapter = adapter(&engine);
    adapter.activate(&hls("s1"));
    adapter.activate(&embedded("cam", "https://player.example/embed/x"));

    assert_eq!(
        engine.log(),
        vec!["start https://example.com/s1.m3u8", "stop https://example.com/s1.m3u8"]
    );
    assert!(adapter.embedded_source().is_some());
}

#[test]
fn test_teardown_stops_session() {
    let engine = FakeEngine::default();
    let mut adapter = adapter(&engine);
    adapter.activate(&hls("s1"));
    adapter.teardown();

    assert!(adapter.current().is_none());
    assert_eq!(engine.log().last().unwrap(), "stop https://example.com/s1.m3u8");
}

#[test]
fn test_embed_source_mute_rewrite() {
    let src = "https://www.youtube.com/embed/abc?autoplay=1&mute=1&controls=0";
    assert_eq!(embed_source(src, None), src);
    assert_eq!(
        embed_source(src, Some(0.0)),
        "https://www.youtube.com/embed/abc?autoplay=1&controls=0&mute=1"
    );
    assert_eq!(
        embed_source(src, Some(0.8)),
        "https://www.youtube.com/embed/abc?autoplay=1&controls=0&mute=0"
    );
    assert_eq!(
        embed_source("https://example.com/embed", Some(0.0)),
        "https://example.com/embed?mute=1"
    );
}

#[test]
fn test_drive_failover_switches_then_tears_down() {
    let engine = FakeEngine::default();
    let mut adapter = adapter(&engine);
    let catalog = StreamCatalog::new(vec![hls("s1"), hls("s2")]).unwrap();
    let mut failover = FailoverController::new(catalog);

    assert!(drive_failover(&mut adapter, &mut failover));
    assert_eq!(adapter.current().unwrap().id().as_str(), "s1");

    // A second pass with nothing new keeps the same session
    assert!(drive_failover(&mut adapter, &mut failover));
    assert_eq!(engine.log(), vec!["start https://example.com/s1.m3u8"]);

    engine.send(fatal(FaultKind::Transport));
    assert!(drive_failover(&mut adapter, &mut failover));
    assert_eq!(adapter.current().unwrap().id().as_str(), "s2");
    assert!(failover.is_failed(&StreamId::from("s1")));

    engine.send(fatal(FaultKind::Media));
    assert!(!drive_failover(&mut adapter, &mut failover));
    assert!(failover.is_all_failed());
    assert!(adapter.current().is_none());
    assert_eq!(
        engine.log(),
        vec![
            "start https://example.com/s1.m3u8",
            "stop https://example.com/s1.m3u8",
            "start https://example.com/s2.m3u8",
            "stop https://example.com/s2.m3u8",
        ]
    );

    // Stays down
    assert!(!drive_failover(&mut adapter, &mut failover));
    assert_eq!(engine.log().len(), 4);
}

#[test]
fn test_drive_failover_ignores_stale_session_errors() {
    let engine = FakeEngine::default();
    let mut adapter = adapter(&engine);
    let catalog = StreamCatalog::new(vec![hls("s1"), hls("s2"), hls("s3")]).unwrap();
    let mut failover = FailoverController::new(catalog);

    drive_failover(&mut adapter, &mut failover);
    engine.send(fatal(FaultKind::Transport));
    drive_failover(&mut adapter, &mut failover);
    assert_eq!(adapter.current().unwrap().id().as_str(), "s2");

    // The first session reports again after it was replaced
    engine.send_to(0, fatal(FaultKind::Transport));
    assert!(drive_failover(&mut adapter, &mut failover));
    assert_eq!(adapter.current().unwrap().id().as_str(), "s2");
    assert_eq!(failover.failed().len(), 1);
}
