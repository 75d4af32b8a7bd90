//! Per-frame processing: hand presence gate, finger count, confirmation.
//!
//! Frames without a large enough contour report "no hand" and leave the state
//! machine untouched, so a hand briefly leaving the region of interest does not
//! restart a hold in progress.

use crate::fingers::FingerCounter;
use crate::frame::HandFrame;
use crate::gesture::{GestureEvent, GestureSettings, GestureStateMachine, GestureStatus};

/// Default minimum contour area (square pixels) for a hand to be present.
pub const DEFAULT_MIN_CONTOUR_AREA: f64 = 10_000.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PipelineSettings {
    pub min_contour_area: f64,
    pub counter: FingerCounter,
    pub gesture: GestureSettings,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            min_contour_area: DEFAULT_MIN_CONTOUR_AREA,
            counter: FingerCounter::default(),
            gesture: GestureSettings::default(),
        }
    }
}

/// What one frame produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameOutcome {
    pub hand_present: bool,
    pub finger_count: u32,
    pub event: Option<GestureEvent>,
    pub status: GestureStatus,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub frames: u64,
    pub frames_with_hand: u64,
    pub mode_changes: u64,
    pub commands: u64,
}

pub struct GesturePipeline {
    min_contour_area: f64,
    counter: FingerCounter,
    machine: GestureStateMachine,
    stats: PipelineStats,
}

impl GesturePipeline {
    pub fn new(settings: PipelineSettings) -> Self {
        Self {
            min_contour_area: settings.min_contour_area,
            counter: settings.counter,
            machine: GestureStateMachine::new(settings.gesture),
            stats: PipelineStats::default(),
        }
    }

    pub fn machine(&self) -> &GestureStateMachine {
        &self.machine
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    pub fn process(&mut self, frame: &HandFrame) -> FrameOutcome {
        self.stats.frames += 1;

        let Some(contour) = frame
            .contour
            .as_ref()
            .filter(|contour| contour.area() > self.min_contour_area)
        else {
            return FrameOutcome {
                hand_present: false,
                finger_count: 0,
                event: None,
                status: GestureStatus::NoHand,
            };
        };
        self.stats.frames_with_hand += 1;

        let finger_count = self.counter.count(contour, frame.defects());
        let step = self.machine.advance(finger_count, frame.captured_at);
        log::trace!(
            "frame {}: fingers={} state={} status={}",
            self.stats.frames,
            finger_count,
            self.machine.state().as_str(),
            step.status
        );

        match step.event {
            Some(GestureEvent::ModeChange) => self.stats.mode_changes += 1,
            Some(GestureEvent::Command(_)) => self.stats.commands += 1,
            None => {}
        }

        FrameOutcome {
            hand_present: true,
            finger_count,
            event: step.event,
            status: step.status,
        }
    }
}

impl Default for GesturePipeline {
    fn default() -> Self {
        Self::new(PipelineSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::GestureState;
    use crate::ingest::synthetic::hand_geometry;
    use std::time::{Duration, Instant};

    fn frame(fingers: u32, at: Instant) -> HandFrame {
        let (contour, defects) = hand_geometry(fingers);
        HandFrame::new(Some(contour), Some(defects), at)
    }

    #[test]
    fn small_contour_is_no_hand() {
        let mut pipeline = GesturePipeline::new(PipelineSettings {
            min_contour_area: 1.0e9,
            ..PipelineSettings::default()
        });
        let outcome = pipeline.process(&frame(5, Instant::now()));
        assert!(!outcome.hand_present);
        assert_eq!(outcome.status, GestureStatus::NoHand);
        assert_eq!(outcome.status.to_string(), "No hand detected");
        assert_eq!(pipeline.stats().frames_with_hand, 0);
    }

    #[test]
    fn missing_hand_does_not_touch_the_machine() {
        let mut pipeline = GesturePipeline::default();
        let base = Instant::now();
        pipeline.process(&frame(5, base));
        assert!(pipeline.machine().palm_timer_running());

        let outcome = pipeline.process(&HandFrame::empty(base + Duration::from_secs(1)));
        assert_eq!(outcome.status, GestureStatus::NoHand);
        assert!(pipeline.machine().palm_timer_running());

        let outcome = pipeline.process(&frame(5, base + Duration::from_secs(3)));
        assert_eq!(outcome.event, Some(GestureEvent::ModeChange));
    }

    #[test]
    fn hand_without_defects_counts_zero() {
        let mut pipeline = GesturePipeline::default();
        let (contour, _) = hand_geometry(5);
        let outcome = pipeline.process(&HandFrame::new(Some(contour), None, Instant::now()));
        assert!(outcome.hand_present);
        assert_eq!(outcome.finger_count, 0);
        assert_eq!(outcome.status, GestureStatus::ShowPalm);
    }

    #[test]
    fn huge_contour_is_a_hand_not_a_panic() {
        use crate::geometry::{Contour, Point2D};

        let contour = Contour::new(vec![
            Point2D::new(i32::MIN, i32::MIN),
            Point2D::new(i32::MAX, i32::MIN),
            Point2D::new(i32::MAX, i32::MAX),
            Point2D::new(i32::MIN, i32::MAX),
        ]);
        let mut pipeline = GesturePipeline::default();
        let outcome = pipeline.process(&HandFrame::new(Some(contour), None, Instant::now()));
        assert!(outcome.hand_present);
        assert_eq!(outcome.finger_count, 0);
    }

    #[test]
    fn counts_events_in_stats() {
        let mut pipeline = GesturePipeline::default();
        let base = Instant::now();
        let mut events = Vec::new();
        for i in 0..=31u64 {
            let outcome = pipeline.process(&frame(5, base + Duration::from_millis(i * 100)));
            events.extend(outcome.event);
        }
        for i in 32..=64u64 {
            let outcome = pipeline.process(&frame(3, base + Duration::from_millis(i * 100)));
            assert_eq!(outcome.finger_count, 3);
            events.extend(outcome.event);
        }
        assert_eq!(events, vec![GestureEvent::ModeChange, GestureEvent::Command(3)]);
        let stats = pipeline.stats();
        assert_eq!(stats.mode_changes, 1);
        assert_eq!(stats.commands, 1);
        assert_eq!(stats.frames, 65);
        assert_eq!(pipeline.machine().state(), GestureState::DetectingPalm);
    }
}
