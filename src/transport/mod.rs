//! Actuator transport.
//!
//! Confirmed gesture events leave the process through an `ActuatorLink`.
//! Opening the link is an explicit result: when no port is configured, or the
//! port cannot be opened, the caller still gets a working link (`NullLink`)
//! together with a `LinkStatus` saying why nothing will be delivered. The frame
//! loop behaves identically either way.
//!
//! Sends happen on the `Dispatcher` thread so a slow or absent actuator never
//! stalls frame processing.

use std::fmt;
use std::time::Duration;

use anyhow::Result;

pub mod dispatch;
pub mod serial;

pub use dispatch::{DispatchStats, Dispatcher};
pub use serial::SerialLink;

pub const DEFAULT_BAUD: u32 = 9600;
pub const DEFAULT_SETTLE: Duration = Duration::from_secs(2);
pub const DEFAULT_COMMAND_PAUSE: Duration = Duration::from_millis(500);

/// Bytes written once after opening a port to check the link.
pub const PROBE_PAYLOAD: &[u8] = b"11";

/// Byte sink for encoded gesture events.
pub trait ActuatorLink: Send {
    fn name(&self) -> &'static str;

    /// Write `payload` to the actuator.
    fn send(&mut self, payload: &[u8]) -> Result<()>;

    fn is_connected(&self) -> bool;
}

/// Link that accepts and discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullLink;

impl ActuatorLink for NullLink {
    fn name(&self) -> &'static str {
        "null"
    }

    fn send(&mut self, payload: &[u8]) -> Result<()> {
        log::debug!("null link: discarding {} byte(s)", payload.len());
        Ok(())
    }

    fn is_connected(&self) -> bool {
        false
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActuatorConfig {
    /// Serial device path; `None` runs without an actuator.
    pub port: Option<String>,
    pub baud: u32,
    /// Wait after opening the port (boards commonly reset on open).
    pub settle: Duration,
    /// Pause after each delivered command.
    pub command_pause: Duration,
    /// Send `PROBE_PAYLOAD` once connected.
    pub probe_on_connect: bool,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud: DEFAULT_BAUD,
            settle: DEFAULT_SETTLE,
            command_pause: DEFAULT_COMMAND_PAUSE,
            probe_on_connect: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkStatus {
    Connected { port: String },
    /// No port configured.
    Disabled,
    /// Port configured but could not be opened.
    Failed { port: String, reason: String },
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected { port } => write!(f, "connected to {}", port),
            Self::Disabled => write!(f, "disabled (no port configured)"),
            Self::Failed { port, reason } => write!(f, "failed to open {}: {}", port, reason),
        }
    }
}

pub struct Connection {
    pub link: Box<dyn ActuatorLink>,
    pub status: LinkStatus,
}

impl Connection {
    fn null(status: LinkStatus) -> Self {
        Self {
            link: Box::new(NullLink),
            status,
        }
    }
}

/// Open the configured actuator, degrading to `NullLink` on any failure.
pub fn connect(config: &ActuatorConfig) -> Connection {
    let Some(port) = config.port.clone() else {
        return Connection::null(LinkStatus::Disabled);
    };

    match SerialLink::open(&port, config.baud, config.settle) {
        Ok(mut link) => {
            if config.probe_on_connect {
                if let Err(err) = link.send(PROBE_PAYLOAD) {
                    log::warn!("actuator probe on {} failed: {:#}", port, err);
                }
            }
            Connection {
                link: Box::new(link),
                status: LinkStatus::Connected { port },
            }
        }
        Err(err) => Connection::null(LinkStatus::Failed {
            port,
            reason: format!("{:#}", err),
        }),
    }
}
