//! End-to-end runs: geometry source -> pipeline -> dispatcher -> link.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Result;
use gesture_relay::ingest::synthetic::hand_geometry;
use gesture_relay::{
    open_source, ActuatorLink, Dispatcher, GeometrySource, GestureEvent, GesturePipeline,
    GestureState, HandFrame, PipelineSettings, SourceConfig,
};

#[derive(Clone, Default)]
struct CapturingLink {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl ActuatorLink for CapturingLink {
    fn name(&self) -> &'static str {
        "capture"
    }

    fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.bytes.lock().unwrap().extend_from_slice(payload);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        true
    }
}

fn run_source(url: &str, fps: u32) -> (Vec<GestureEvent>, GesturePipeline) {
    let mut source = open_source(&SourceConfig {
        url: url.to_string(),
        target_fps: fps,
    })
    .expect("open source");
    source.connect().expect("connect");

    let mut pipeline = GesturePipeline::new(PipelineSettings::default());
    let mut events = Vec::new();
    while let Some(frame) = source.next_frame().expect("frame") {
        events.extend(pipeline.process(&frame).event);
    }
    (events, pipeline)
}

#[test]
fn scripted_palm_then_fingers_emits_mode_change_then_command() {
    for n in 1..=5 {
        let (events, pipeline) = run_source(&format!("stub://palm-then-{n}"), 30);
        assert_eq!(
            events,
            vec![GestureEvent::ModeChange, GestureEvent::Command(n)],
            "palm-then-{n}"
        );
        assert_eq!(pipeline.machine().state(), GestureState::DetectingPalm);
    }
}

#[test]
fn idle_scene_emits_nothing() {
    let (events, pipeline) = run_source("stub://idle", 30);
    assert!(events.is_empty());
    assert_eq!(pipeline.stats().frames_with_hand, 0);
}

#[test]
fn confirmed_events_reach_the_link_as_wire_bytes() {
    let link = CapturingLink::default();
    let bytes = link.bytes.clone();
    let mut dispatcher = Dispatcher::spawn(Box::new(link), Duration::ZERO).expect("dispatcher");

    let (events, _) = run_source("stub://palm-then-3", 10);
    for event in events {
        assert!(dispatcher.dispatch(event));
    }
    let stats = dispatcher.shutdown().expect("shutdown");

    assert_eq!(stats.delivered, 2);
    assert_eq!(bytes.lock().unwrap().as_slice(), b"S3");
}

#[test]
fn recorded_session_replays_from_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp recording");
    let (palm, palm_defects) = hand_geometry(5);
    let (two, two_defects) = hand_geometry(2);
    let line = |contour: &gesture_relay::Contour, defects: &[gesture_relay::ConvexityDefect]| {
        let points: Vec<[i32; 2]> = contour.points().iter().map(|p| [p.x, p.y]).collect();
        let defects: Vec<[u64; 4]> = defects
            .iter()
            .map(|d| [d.start as u64, d.end as u64, d.far as u64, u64::from(d.depth)])
            .collect();
        serde_json::json!({ "contour": points, "defects": defects }).to_string()
    };

    let mut lines = vec!["# palm for 3.5s, two fingers for 3.5s at 10 fps".to_string()];
    lines.extend(std::iter::repeat(line(&palm, &palm_defects)).take(35));
    lines.extend(std::iter::repeat("{}".to_string()).take(5));
    lines.extend(std::iter::repeat(line(&two, &two_defects)).take(35));
    std::io::Write::write_all(&mut file, lines.join("\n").as_bytes()).expect("write");

    let path = file.path().to_string_lossy().to_string();
    let (events, pipeline) = run_source(&path, 10);
    assert_eq!(events, vec![GestureEvent::ModeChange, GestureEvent::Command(2)]);
    assert_eq!(pipeline.stats().frames, 75);
    assert_eq!(pipeline.stats().frames_with_hand, 70);
}

#[test]
fn held_command_is_not_repeated_after_confirmation() {
    let mut pipeline = GesturePipeline::default();
    let base = Instant::now();
    let mut events = Vec::new();
    let mut at = base;
    let pose = |fingers: u32, at: Instant| {
        let (contour, defects) = hand_geometry(fingers);
        HandFrame::new(Some(contour), Some(defects), at)
    };

    for _ in 0..=31 {
        events.extend(pipeline.process(&pose(5, at)).event);
        at += Duration::from_millis(100);
    }
    for _ in 0..200 {
        events.extend(pipeline.process(&pose(2, at)).event);
        at += Duration::from_millis(100);
    }
    assert_eq!(events, vec![GestureEvent::ModeChange, GestureEvent::Command(2)]);
}
