use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::fingers::FingerCounter;
use crate::gesture::GestureSettings;
use crate::ingest::SourceConfig;
use crate::pipeline::PipelineSettings;
use crate::transport::ActuatorConfig;

pub const CONFIG_ENV: &str = "GESTURE_RELAY_CONFIG";

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RelayConfigFile {
    source: Option<SourceConfigFile>,
    hand: Option<HandConfigFile>,
    fingers: Option<FingersConfigFile>,
    gesture: Option<GestureConfigFile>,
    actuator: Option<ActuatorConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct SourceConfigFile {
    url: Option<String>,
    target_fps: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct HandConfigFile {
    min_contour_area: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct FingersConfigFile {
    depth_threshold: Option<u32>,
    angle_threshold_deg: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct GestureConfigFile {
    confirm_secs: Option<f64>,
    palm_threshold: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ActuatorConfigFile {
    port: Option<String>,
    baud: Option<u32>,
    settle_ms: Option<u64>,
    command_pause_ms: Option<u64>,
    probe_on_connect: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelayConfig {
    pub source: SourceConfig,
    pub pipeline: PipelineSettings,
    pub actuator: ActuatorConfig,
}

impl RelayConfig {
    /// Defaults, then the file named by `GESTURE_RELAY_CONFIG`, then env overrides.
    pub fn load() -> Result<Self> {
        let file_cfg = match std::env::var(CONFIG_ENV).ok().as_deref() {
            Some(path) if !path.trim().is_empty() => read_config_file(Path::new(path))?,
            _ => RelayConfigFile::default(),
        };
        let mut cfg = Self::from_file(file_cfg)?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: RelayConfigFile) -> Result<Self> {
        let defaults = Self::default();

        let source = file.source.unwrap_or_default();
        let source = SourceConfig {
            url: source.url.unwrap_or(defaults.source.url),
            target_fps: source.target_fps.unwrap_or(defaults.source.target_fps),
        };

        let hand = file.hand.unwrap_or_default();
        let fingers = file.fingers.unwrap_or_default();
        let gesture = file.gesture.unwrap_or_default();
        let confirm_duration = match gesture.confirm_secs {
            Some(secs) => duration_from_secs(secs, "gesture.confirm_secs")?,
            None => defaults.pipeline.gesture.confirm_duration,
        };
        let pipeline = PipelineSettings {
            min_contour_area: hand
                .min_contour_area
                .unwrap_or(defaults.pipeline.min_contour_area),
            counter: FingerCounter {
                angle_threshold_deg: fingers
                    .angle_threshold_deg
                    .unwrap_or(defaults.pipeline.counter.angle_threshold_deg),
                depth_threshold: fingers
                    .depth_threshold
                    .unwrap_or(defaults.pipeline.counter.depth_threshold),
            },
            gesture: GestureSettings {
                confirm_duration,
                palm_threshold: gesture
                    .palm_threshold
                    .unwrap_or(defaults.pipeline.gesture.palm_threshold),
            },
        };

        let actuator = file.actuator.unwrap_or_default();
        let actuator = ActuatorConfig {
            port: actuator
                .port
                .filter(|port| !port.trim().is_empty())
                .or(defaults.actuator.port),
            baud: actuator.baud.unwrap_or(defaults.actuator.baud),
            settle: actuator
                .settle_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.actuator.settle),
            command_pause: actuator
                .command_pause_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.actuator.command_pause),
            probe_on_connect: actuator
                .probe_on_connect
                .unwrap_or(defaults.actuator.probe_on_connect),
        };

        Ok(Self {
            source,
            pipeline,
            actuator,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(url) = env_string("GESTURE_RELAY_SOURCE") {
            self.source.url = url;
        }
        if let Some(fps) = env_parse::<u32>("GESTURE_RELAY_FPS")? {
            self.source.target_fps = fps;
        }
        if let Some(area) = env_parse::<f64>("GESTURE_RELAY_MIN_AREA")? {
            self.pipeline.min_contour_area = area;
        }
        if let Some(depth) = env_parse::<u32>("GESTURE_RELAY_DEPTH_THRESHOLD")? {
            self.pipeline.counter.depth_threshold = depth;
        }
        if let Some(secs) = env_parse::<f64>("GESTURE_RELAY_CONFIRM_SECS")? {
            self.pipeline.gesture.confirm_duration =
                duration_from_secs(secs, "GESTURE_RELAY_CONFIRM_SECS")?;
        }
        if let Some(port) = env_string("GESTURE_RELAY_SERIAL_PORT") {
            self.actuator.port = Some(port);
        }
        if let Some(baud) = env_parse::<u32>("GESTURE_RELAY_BAUD")? {
            self.actuator.baud = baud;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.source.target_fps == 0 {
            return Err(anyhow!("source.target_fps must be >= 1"));
        }
        if self.pipeline.gesture.confirm_duration.is_zero() {
            return Err(anyhow!("gesture.confirm_secs must be greater than zero"));
        }
        if self.pipeline.gesture.palm_threshold == 0 {
            return Err(anyhow!("gesture.palm_threshold must be >= 1"));
        }
        let angle = self.pipeline.counter.angle_threshold_deg;
        if !(angle > 0.0 && angle <= 180.0) {
            return Err(anyhow!("fingers.angle_threshold_deg must be in (0, 180]"));
        }
        let area = self.pipeline.min_contour_area;
        if !area.is_finite() || area < 0.0 {
            return Err(anyhow!("hand.min_contour_area must be a non-negative number"));
        }
        if self.actuator.baud == 0 {
            return Err(anyhow!("actuator.baud must be >= 1"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<RelayConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}

fn duration_from_secs(secs: f64, name: &str) -> Result<Duration> {
    Duration::try_from_secs_f64(secs)
        .map_err(|_| anyhow!("{} must be a non-negative number of seconds", name))
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>> {
    match env_string(key) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("{} has an invalid value '{}'", key, value)),
        None => Ok(None),
    }
}
