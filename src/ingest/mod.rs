//! Geometry sources.
//!
//! Contour and convexity-defect extraction is done outside this crate by a
//! vision library. A geometry source delivers its output one `HandFrame` at a
//! time:
//! - Recorded JSON-lines files (one frame per line)
//! - Scripted synthetic hands (`stub://` URLs, for demos and tests)
//!
//! Sources stamp frames from a virtual monotonic clock advancing by
//! `1 / target_fps` per frame, so a replay produces the same timing on every
//! run regardless of how fast it is consumed.

use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};

use crate::frame::HandFrame;

pub mod file;
pub mod synthetic;

pub use file::FileSource;
pub use synthetic::SyntheticSource;

/// Default source: a scripted palm followed by three fingers.
pub const DEFAULT_SOURCE_URL: &str = "stub://palm-then-3";
pub const DEFAULT_TARGET_FPS: u32 = 30;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceConfig {
    /// `stub://<scenario>` or a local file path.
    pub url: String,
    pub target_fps: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SOURCE_URL.to_string(),
            target_fps: DEFAULT_TARGET_FPS,
        }
    }
}

/// Producer of per-frame hand geometry.
pub trait GeometrySource {
    /// Connect or open the underlying stream.
    fn connect(&mut self) -> Result<()>;

    /// Next frame, or `None` at end of stream.
    fn next_frame(&mut self) -> Result<Option<HandFrame>>;

    fn is_healthy(&self) -> bool;

    fn stats(&self) -> SourceStats;
}

#[derive(Clone, Debug)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub url: String,
}

/// Open the source named by `config.url`. The source is not yet connected.
pub fn open_source(config: &SourceConfig) -> Result<Box<dyn GeometrySource>> {
    if config.target_fps == 0 {
        return Err(anyhow!("target_fps must be >= 1"));
    }
    if let Some(scenario) = config.url.strip_prefix("stub://") {
        return Ok(Box::new(SyntheticSource::new(scenario, config.target_fps)?));
    }
    if config.url.contains("://") {
        return Err(anyhow!(
            "unsupported source url '{}' (expected stub://<scenario> or a local path)",
            config.url
        ));
    }
    Ok(Box::new(FileSource::new(&config.url, config.target_fps)))
}

/// Virtual monotonic clock shared by the built-in sources.
#[derive(Clone, Debug)]
pub(crate) struct FrameClock {
    base: Instant,
    interval: Duration,
    ticks: u32,
}

impl FrameClock {
    pub(crate) fn new(target_fps: u32) -> Self {
        Self {
            base: Instant::now(),
            interval: Duration::from_secs(1) / target_fps.max(1),
            ticks: 0,
        }
    }

    pub(crate) fn interval(&self) -> Duration {
        self.interval
    }

    /// Timestamp for the next frame.
    pub(crate) fn tick(&mut self) -> Instant {
        let at = self.base + self.interval * self.ticks;
        self.ticks = self.ticks.saturating_add(1);
        at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_advances_by_frame_interval() {
        let mut clock = FrameClock::new(10);
        let first = clock.tick();
        let second = clock.tick();
        let third = clock.tick();
        assert_eq!(second - first, Duration::from_millis(100));
        assert_eq!(third - first, Duration::from_millis(200));
    }

    #[test]
    fn open_source_dispatches_on_scheme() {
        assert!(open_source(&SourceConfig::default()).is_ok());
        let remote = SourceConfig {
            url: "rtsp://camera".to_string(),
            target_fps: 30,
        };
        assert!(open_source(&remote).is_err());
        let zero_fps = SourceConfig {
            url: "stub://idle".to_string(),
            target_fps: 0,
        };
        assert!(open_source(&zero_fps).is_err());
        let unknown = SourceConfig {
            url: "stub://juggling".to_string(),
            target_fps: 30,
        };
        assert!(open_source(&unknown).is_err());
    }
}
