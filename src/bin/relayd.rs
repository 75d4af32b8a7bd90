//! relayd - gesture relay daemon
//!
//! This daemon:
//! 1. Reads hand geometry frames from the configured source
//! 2. Counts fingers and runs the palm/finger confirmation state machine
//! 3. Hands confirmed events to the actuator dispatcher (never blocking)
//! 4. Shows the current gesture status on stderr
//!
//! Stops on Ctrl-C or at end of stream.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use gesture_relay::ui::{StatusLine, UiMode};
use gesture_relay::{
    connect, open_source, Dispatcher, GeometrySource, GesturePipeline, LinkStatus, RelayConfig,
};

const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(author, version, about = "Relay confirmed hand gestures to a serial actuator")]
struct Args {
    /// Geometry source (stub://<scenario> or a JSON-lines recording). Overrides config.
    #[arg(long)]
    source: Option<String>,

    /// Serial device for the actuator. Overrides config.
    #[arg(long)]
    port: Option<String>,

    /// UI mode for the status line (auto|plain|pretty).
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut cfg = RelayConfig::load()?;
    if let Some(source) = args.source {
        cfg.source.url = source;
    }
    if let Some(port) = args.port {
        cfg.actuator.port = Some(port);
    }

    let mut source = open_source(&cfg.source)?;
    source.connect()?;

    let connection = connect(&cfg.actuator);
    match &connection.status {
        LinkStatus::Connected { .. } => log::info!("actuator {}", connection.status),
        LinkStatus::Disabled => log::info!("actuator {}; running in debug mode", connection.status),
        LinkStatus::Failed { .. } => {
            log::warn!("actuator {}; running in debug mode", connection.status)
        }
    }
    let mut dispatcher = Dispatcher::spawn(connection.link, cfg.actuator.command_pause)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_handler = shutdown.clone();
    ctrlc::set_handler(move || {
        shutdown_handler.store(true, Ordering::SeqCst);
    })
    .context("error setting Ctrl-C handler")?;

    let mut pipeline = GesturePipeline::new(cfg.pipeline);
    let mut status = StatusLine::new(UiMode::parse(Some(&args.ui)), std::io::stderr().is_terminal());
    let frame_interval = Duration::from_secs(1) / cfg.source.target_fps;
    let mut last_health_log = Instant::now();

    let gesture = pipeline.machine().settings();
    log::info!(
        "relayd running: source={} fps={} confirm={:?} palm_threshold={}",
        cfg.source.url,
        cfg.source.target_fps,
        gesture.confirm_duration,
        gesture.palm_threshold
    );

    while !shutdown.load(Ordering::SeqCst) {
        let frame_start = Instant::now();

        let Some(frame) = source.next_frame()? else {
            log::info!("end of stream");
            break;
        };
        let outcome = pipeline.process(&frame);
        status.update(&outcome.status);

        if let Some(event) = outcome.event {
            log::info!(
                "confirmed {} (state now {})",
                event,
                pipeline.machine().state().as_str()
            );
            dispatcher.dispatch(event);
        }

        if last_health_log.elapsed() >= HEALTH_LOG_INTERVAL {
            let source_stats = source.stats();
            let stats = pipeline.stats();
            log::info!(
                "source health={} frames={} hand_frames={} commands={} url={}",
                source.is_healthy(),
                source_stats.frames_captured,
                stats.frames_with_hand,
                stats.commands,
                source_stats.url
            );
            last_health_log = Instant::now();
        }

        if let Some(remaining) = frame_interval.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(remaining);
        }
    }

    status.finish("stopped");
    let delivery = dispatcher.shutdown()?;
    let stats = pipeline.stats();
    log::info!(
        "relayd stopped: frames={} mode_changes={} commands={} delivered={} failed={} dropped={}",
        stats.frames,
        stats.mode_changes,
        stats.commands,
        delivery.delivered,
        delivery.failed,
        delivery.dropped
    );
    Ok(())
}
