//! Palm-then-fingers confirmation state machine.
//!
//! Per-frame finger counts are noisy. A command is only produced after two
//! confirmed holds: an open palm held for the confirmation duration switches
//! the machine into counting mode, then a constant finger count held for the
//! same duration becomes exactly one command and the machine returns to
//! waiting for a palm.
//!
//! The machine performs no I/O and never fails. It is driven once per frame by
//! the frame loop, with a monotonic timestamp.

use std::fmt;
use std::time::{Duration, Instant};

/// Default hold time before a palm or finger count is accepted.
pub const DEFAULT_CONFIRM_DURATION: Duration = Duration::from_secs(3);

/// Default minimum finger count treated as an open palm.
pub const DEFAULT_PALM_THRESHOLD: u32 = 4;

/// Tunables for the confirmation state machine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureSettings {
    pub confirm_duration: Duration,
    pub palm_threshold: u32,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            confirm_duration: DEFAULT_CONFIRM_DURATION,
            palm_threshold: DEFAULT_PALM_THRESHOLD,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GestureState {
    DetectingPalm,
    CountingFingers,
}

impl GestureState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DetectingPalm => "detecting-palm",
            Self::CountingFingers => "counting-fingers",
        }
    }
}

/// Intent produced by a confirmed hold. Forwarded to the actuator by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureEvent {
    /// Open palm confirmed; the actuator should expect a finger count next.
    ModeChange,
    /// Finger count confirmed.
    Command(u32),
}

/// Marker byte announcing counting mode on the wire.
pub const MODE_CHANGE_MARKER: u8 = b'S';

impl GestureEvent {
    /// Wire encoding: the mode marker, or the count as decimal ASCII digits.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::ModeChange => vec![MODE_CHANGE_MARKER],
            Self::Command(count) => count.to_string().into_bytes(),
        }
    }
}

impl fmt::Display for GestureEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModeChange => write!(f, "mode-change"),
            Self::Command(count) => write!(f, "command({})", count),
        }
    }
}

/// Human-readable progress for the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureStatus {
    NoHand,
    ShowPalm,
    HoldPalm { remaining_secs: u64 },
    PalmConfirmed,
    HoldFingers { count: u32, remaining_secs: u64 },
    CommandSent { count: u32 },
}

impl fmt::Display for GestureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoHand => write!(f, "No hand detected"),
            Self::ShowPalm => write!(f, "Show open palm"),
            Self::HoldPalm { remaining_secs } => write!(f, "Hold palm open: {}s", remaining_secs),
            Self::PalmConfirmed => write!(f, "Palm detected! Show fingers now."),
            Self::HoldFingers {
                count,
                remaining_secs,
            } => write!(f, "Hold fingers {}: {}s", count, remaining_secs),
            Self::CommandSent { .. } => write!(f, "Command sent! Show palm to reset."),
        }
    }
}

/// Result of one `advance` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Step {
    pub event: Option<GestureEvent>,
    pub status: GestureStatus,
}

impl Step {
    fn quiet(status: GestureStatus) -> Self {
        Self {
            event: None,
            status,
        }
    }
}

/// Hold timer. Elapsed time is clamped at zero if the clock steps backwards.
#[derive(Clone, Copy, Debug, Default)]
struct ConfirmationTimer {
    started_at: Option<Instant>,
}

impl ConfirmationTimer {
    fn start_if_idle(&mut self, now: Instant) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    fn restart(&mut self, now: Instant) {
        self.started_at = Some(now);
    }

    fn clear(&mut self) {
        self.started_at = None;
    }

    fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    fn held(&self, now: Instant) -> Duration {
        self.started_at
            .map(|start| now.saturating_duration_since(start))
            .unwrap_or_default()
    }
}

pub struct GestureStateMachine {
    settings: GestureSettings,
    state: GestureState,
    palm_timer: ConfirmationTimer,
    finger_timer: ConfirmationTimer,
    last_observed: Option<u32>,
}

impl GestureStateMachine {
    pub fn new(settings: GestureSettings) -> Self {
        Self {
            settings,
            state: GestureState::DetectingPalm,
            palm_timer: ConfirmationTimer::default(),
            finger_timer: ConfirmationTimer::default(),
            last_observed: None,
        }
    }

    pub fn settings(&self) -> &GestureSettings {
        &self.settings
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    /// Last count seen in counting mode; `None` right after entering it.
    pub fn last_observed(&self) -> Option<u32> {
        self.last_observed
    }

    pub fn palm_timer_running(&self) -> bool {
        self.palm_timer.is_running()
    }

    pub fn finger_timer_running(&self) -> bool {
        self.finger_timer.is_running()
    }

    /// Back to the initial state with both timers cleared.
    pub fn reset(&mut self) {
        self.state = GestureState::DetectingPalm;
        self.clear_progress();
    }

    /// Feed one frame's finger count. Must be called in frame order.
    pub fn advance(&mut self, observed: u32, now: Instant) -> Step {
        match self.state {
            GestureState::DetectingPalm => self.detect_palm(observed, now),
            GestureState::CountingFingers => self.count_fingers(observed, now),
        }
    }

    fn detect_palm(&mut self, observed: u32, now: Instant) -> Step {
        if observed < self.settings.palm_threshold {
            self.palm_timer.clear();
            return Step::quiet(GestureStatus::ShowPalm);
        }

        self.palm_timer.start_if_idle(now);
        let held = self.palm_timer.held(now);
        if held < self.settings.confirm_duration {
            return Step::quiet(GestureStatus::HoldPalm {
                remaining_secs: self.remaining_secs(held),
            });
        }

        self.state = GestureState::CountingFingers;
        self.clear_progress();
        log::debug!("palm confirmed after {:.2}s", held.as_secs_f64());
        Step {
            event: Some(GestureEvent::ModeChange),
            status: GestureStatus::PalmConfirmed,
        }
    }

    fn count_fingers(&mut self, observed: u32, now: Instant) -> Step {
        if self.last_observed != Some(observed) {
            self.last_observed = Some(observed);
            self.finger_timer.restart(now);
            return Step::quiet(GestureStatus::HoldFingers {
                count: observed,
                remaining_secs: self.remaining_secs(Duration::ZERO),
            });
        }

        let held = self.finger_timer.held(now);
        if held < self.settings.confirm_duration {
            return Step::quiet(GestureStatus::HoldFingers {
                count: observed,
                remaining_secs: self.remaining_secs(held),
            });
        }

        self.state = GestureState::DetectingPalm;
        self.clear_progress();
        log::debug!("finger count {} confirmed after {:.2}s", observed, held.as_secs_f64());
        Step {
            event: Some(GestureEvent::Command(observed)),
            status: GestureStatus::CommandSent { count: observed },
        }
    }

    fn clear_progress(&mut self) {
        self.palm_timer.clear();
        self.finger_timer.clear();
        self.last_observed = None;
    }

    /// Whole seconds left, counted the way the status line shows them.
    ///
    /// Rounds up, so a fractional hold such as 2.5 s starts the countdown at
    /// `3s` rather than showing the fraction.
    fn remaining_secs(&self, held: Duration) -> u64 {
        let whole_held = Duration::from_secs(held.as_secs());
        self.settings
            .confirm_duration
            .saturating_sub(whole_held)
            .as_secs_f64()
            .ceil() as u64
    }
}

impl Default for GestureStateMachine {
    fn default() -> Self {
        Self::new(GestureSettings::default())
    }
}
