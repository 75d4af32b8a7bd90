//! Scripted synthetic hands (`stub://` URLs).
//!
//! Scenarios:
//! - `stub://idle`: five seconds with nothing in view
//! - `stub://palm-then-N` (N in 0..=5): one second empty, an open palm for four
//!   seconds, N fingers for four seconds, one second empty
//!
//! Each pose is held longer than the default confirmation duration, so
//! `palm-then-N` produces a mode change followed by `Command(N)` (a fist reads
//! as one finger, see `fingers`).

use anyhow::{anyhow, Result};

use super::{FrameClock, GeometrySource, SourceStats};
use crate::frame::HandFrame;
use crate::geometry::{Contour, ConvexityDefect, Point2D};

const FINGER_WIDTH: i32 = 50;
const PALM_TOP: i32 = 150;
const WRIST: i32 = 300;
const VALLEY_Y: i32 = 120;
const VALLEY_DEPTH: u32 = 30_720;
const WRIST_DEFECT_DEPTH: u32 = 2_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Pose {
    Empty,
    Fingers(u32),
}

/// Synthetic hand contour with `fingers` raised (clamped to 1..=5) and its defects.
///
/// Fingers are 50px-wide spikes on a palm block. Every gap between two tips
/// yields a deep ~24 degree valley; a shallow wrist defect is always present so
/// the defect list is never empty.
pub fn hand_geometry(fingers: u32) -> (Contour, Vec<ConvexityDefect>) {
    let n = fingers.clamp(1, 5) as i32;
    let width = FINGER_WIDTH * n;

    let mut points = vec![Point2D::new(0, WRIST), Point2D::new(0, PALM_TOP)];
    let mut defects = vec![ConvexityDefect::new(0, 1, 2, WRIST_DEFECT_DEPTH)];
    points.push(Point2D::new(FINGER_WIDTH / 2, 0));
    for j in 1..n {
        let valley = points.len();
        points.push(Point2D::new(FINGER_WIDTH * j, VALLEY_Y));
        points.push(Point2D::new(FINGER_WIDTH * j + FINGER_WIDTH / 2, 0));
        defects.push(ConvexityDefect::new(
            valley - 1,
            valley + 1,
            valley,
            VALLEY_DEPTH,
        ));
    }
    points.push(Point2D::new(width, PALM_TOP));
    points.push(Point2D::new(width, WRIST));

    (Contour::new(points), defects)
}

pub struct SyntheticSource {
    scenario: String,
    script: Vec<(Pose, u32)>,
    clock: FrameClock,
    segment: usize,
    frames_in_segment: u32,
    frame_count: u64,
    connected: bool,
}

impl SyntheticSource {
    pub fn new(scenario: &str, target_fps: u32) -> Result<Self> {
        let fps = target_fps.max(1);
        let secs = |s: u32| s * fps;
        let script = match scenario {
            "idle" => vec![(Pose::Empty, secs(5))],
            _ => {
                let fingers = scenario
                    .strip_prefix("palm-then-")
                    .and_then(|n| n.parse::<u32>().ok())
                    .filter(|n| *n <= 5)
                    .ok_or_else(|| anyhow!("unknown synthetic scenario '{}'", scenario))?;
                vec![
                    (Pose::Empty, secs(1)),
                    (Pose::Fingers(5), secs(4)),
                    (Pose::Fingers(fingers), secs(4)),
                    (Pose::Empty, secs(1)),
                ]
            }
        };
        Ok(Self {
            scenario: scenario.to_string(),
            script,
            clock: FrameClock::new(fps),
            segment: 0,
            frames_in_segment: 0,
            frame_count: 0,
            connected: false,
        })
    }

    fn next_pose(&mut self) -> Option<Pose> {
        loop {
            let (pose, len) = *self.script.get(self.segment)?;
            if self.frames_in_segment < len {
                self.frames_in_segment += 1;
                return Some(pose);
            }
            self.segment += 1;
            self.frames_in_segment = 0;
        }
    }
}

impl GeometrySource for SyntheticSource {
    fn connect(&mut self) -> Result<()> {
        self.connected = true;
        log::info!(
            "SyntheticSource: scenario {} ({} ms/frame)",
            self.scenario,
            self.clock.interval().as_millis()
        );
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<HandFrame>> {
        if !self.connected {
            return Err(anyhow!("synthetic source not connected"));
        }
        let Some(pose) = self.next_pose() else {
            return Ok(None);
        };
        self.frame_count += 1;
        let at = self.clock.tick();
        Ok(Some(match pose {
            Pose::Empty => HandFrame::empty(at),
            Pose::Fingers(n) => {
                let (contour, defects) = hand_geometry(n);
                HandFrame::new(Some(contour), Some(defects), at)
            }
        }))
    }

    fn is_healthy(&self) -> bool {
        self.connected
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            url: format!("stub://{}", self.scenario),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingers::FingerCounter;
    use crate::pipeline::DEFAULT_MIN_CONTOUR_AREA;

    #[test]
    fn synthetic_hands_count_as_scripted() {
        let counter = FingerCounter::default();
        for n in 1..=5 {
            let (contour, defects) = hand_geometry(n);
            assert!(contour.area() > DEFAULT_MIN_CONTOUR_AREA, "n={n}");
            assert_eq!(counter.count(&contour, Some(defects.as_slice())), n);
        }
        let (contour, defects) = hand_geometry(0);
        assert_eq!(counter.count(&contour, Some(defects.as_slice())), 1);
    }

    #[test]
    fn script_runs_once_then_ends() {
        let mut source = SyntheticSource::new("palm-then-2", 10).unwrap();
        assert!(source.next_frame().is_err());
        source.connect().unwrap();
        let mut frames = 0;
        let mut with_hand = 0;
        while let Some(frame) = source.next_frame().unwrap() {
            frames += 1;
            if frame.contour.is_some() {
                with_hand += 1;
            }
        }
        assert_eq!(frames, 100);
        assert_eq!(with_hand, 80);
        assert_eq!(source.stats().frames_captured, 100);
    }

    #[test]
    fn rejects_unknown_scenarios() {
        assert!(SyntheticSource::new("palm-then-6", 10).is_err());
        assert!(SyntheticSource::new("wave", 10).is_err());
        assert!(SyntheticSource::new("idle", 10).is_ok());
    }
}
