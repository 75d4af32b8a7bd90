//! Background delivery of gesture events.
//!
//! The frame loop hands events to `Dispatcher::dispatch`, which never blocks:
//! events go through a small bounded queue to a worker thread that owns the
//! link. A full queue drops the event and logs it. After each delivered
//! command the worker pauses so a slow link is not flooded.

use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{anyhow, Result};

use super::ActuatorLink;
use crate::gesture::GestureEvent;

/// Events that may wait for the link before new ones are dropped.
pub const DISPATCH_QUEUE_DEPTH: usize = 8;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub delivered: u64,
    pub failed: u64,
    pub dropped: u64,
}

pub struct Dispatcher {
    tx: Option<SyncSender<GestureEvent>>,
    join: Option<JoinHandle<DispatchStats>>,
    dropped: u64,
}

impl Dispatcher {
    pub fn spawn(link: Box<dyn ActuatorLink>, command_pause: Duration) -> Result<Self> {
        let (tx, rx) = mpsc::sync_channel::<GestureEvent>(DISPATCH_QUEUE_DEPTH);
        let join = std::thread::Builder::new()
            .name("actuator".to_string())
            .spawn(move || {
                let mut link = link;
                let mut stats = DispatchStats::default();
                for event in rx {
                    match link.send(&event.encode()) {
                        Ok(()) => {
                            stats.delivered += 1;
                            log::info!("sent {} via {} link", event, link.name());
                            if matches!(event, GestureEvent::Command(_)) && !command_pause.is_zero()
                            {
                                std::thread::sleep(command_pause);
                            }
                        }
                        Err(err) => {
                            stats.failed += 1;
                            log::warn!("failed to send {}: {:#}", event, err);
                        }
                    }
                }
                stats
            })?;
        Ok(Self {
            tx: Some(tx),
            join: Some(join),
            dropped: 0,
        })
    }

    /// Queue `event` for delivery. Returns false if it had to be dropped.
    pub fn dispatch(&mut self, event: GestureEvent) -> bool {
        let Some(tx) = &self.tx else {
            return false;
        };
        match tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                self.dropped += 1;
                log::warn!("actuator busy, dropping {}", event);
                false
            }
            Err(TrySendError::Disconnected(event)) => {
                self.dropped += 1;
                log::error!("actuator worker gone, dropping {}", event);
                false
            }
        }
    }

    /// Deliver whatever is queued, then stop the worker.
    pub fn shutdown(mut self) -> Result<DispatchStats> {
        self.tx.take();
        let mut stats = match self.join.take() {
            Some(join) => {
                log::debug!("waiting for actuator worker to drain");
                join
                    .join()
                    .map_err(|_| anyhow!("actuator thread panicked"))?
            }
            None => DispatchStats::default(),
        };
        stats.dropped = self.dropped;
        Ok(stats)
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(join) = self.join.take() {
            log::debug!("waiting for actuator worker to drain");
            let _ = join.join();
        }
    }
}
