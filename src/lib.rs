//! Gesture relay
//!
//! Turns per-frame hand geometry into confirmed actuator commands.
//!
//! # Architecture
//!
//! A geometry source (external vision code, a recording, or a synthetic
//! script) delivers one hand contour and its convexity defects per frame. The
//! relay reduces that to a finger count and feeds it to a confirmation state
//! machine:
//!
//! 1. **Palm**: an open palm (4+ fingers) held for the confirmation duration
//!    emits a mode change.
//! 2. **Count**: a constant finger count held for the same duration emits one
//!    command, and the machine waits for a palm again.
//!
//! Events are encoded as single ASCII tokens and delivered to a serial
//! actuator off the frame thread. A missing actuator degrades to a null link;
//! the frame loop is identical either way.
//!
//! # Module Structure
//!
//! - `geometry`: Point2D, Contour, ConvexityDefect
//! - `fingers`: finger counting from defects
//! - `gesture`: confirmation state machine, events, status text
//! - `pipeline`: per-frame hand gate + counter + state machine
//! - `ingest`: geometry sources (recordings, synthetic)
//! - `transport`: actuator links and the event dispatcher
//! - `config`, `ui`: configuration and terminal status

pub mod config;
pub mod fingers;
pub mod frame;
pub mod geometry;
pub mod gesture;
pub mod ingest;
pub mod pipeline;
pub mod transport;
pub mod ui;

pub use config::RelayConfig;
pub use fingers::FingerCounter;
pub use frame::HandFrame;
pub use geometry::{Contour, ConvexityDefect, Point2D};
pub use gesture::{
    GestureEvent, GestureSettings, GestureState, GestureStateMachine, GestureStatus, Step,
};
pub use ingest::{open_source, FileSource, GeometrySource, SourceConfig, SyntheticSource};
pub use pipeline::{FrameOutcome, GesturePipeline, PipelineSettings, PipelineStats};
pub use transport::{
    connect, ActuatorConfig, ActuatorLink, Connection, Dispatcher, LinkStatus, NullLink,
    SerialLink,
};
