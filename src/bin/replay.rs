//! replay - run a geometry recording through the gesture pipeline offline
//!
//! Frames are stamped from a virtual clock at `--fps`, so the output depends
//! only on the recording and the settings. Nothing is sent to an actuator.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde::Serialize;
use std::time::Duration;

use gesture_relay::{
    open_source, GeometrySource, GestureEvent, GesturePipeline, RelayConfig, SourceConfig,
};

#[derive(Parser, Debug)]
#[command(
    name = "replay",
    about = "Replay hand geometry through the gesture pipeline and print confirmed events"
)]
struct Args {
    /// JSON-lines recording, or stub://<scenario>.
    input: String,

    /// Frame rate the recording was captured at.
    #[arg(long)]
    fps: Option<u32>,

    /// Override the confirmation hold, in seconds.
    #[arg(long)]
    confirm_secs: Option<f64>,

    /// Print events as JSON lines.
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct EventRecord<'a> {
    frame: u64,
    at_ms: u128,
    event: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<u32>,
    wire: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let mut cfg = RelayConfig::load()?;
    if let Some(secs) = args.confirm_secs {
        cfg.pipeline.gesture.confirm_duration = Duration::try_from_secs_f64(secs)
            .ok()
            .filter(|d| !d.is_zero())
            .ok_or_else(|| anyhow!("--confirm-secs must be a positive number"))?;
    }
    let source_cfg = SourceConfig {
        url: args.input.clone(),
        target_fps: args.fps.unwrap_or(cfg.source.target_fps),
    };

    let mut source = open_source(&source_cfg)?;
    source
        .connect()
        .with_context(|| format!("failed to open {}", args.input))?;

    let mut pipeline = GesturePipeline::new(cfg.pipeline);
    let mut first_at = None;
    while let Some(frame) = source.next_frame()? {
        let start = *first_at.get_or_insert(frame.captured_at);
        let outcome = pipeline.process(&frame);
        let Some(event) = outcome.event else {
            continue;
        };
        let frame_no = pipeline.stats().frames;
        let at_ms = frame.captured_at.saturating_duration_since(start).as_millis();
        let wire = String::from_utf8_lossy(&event.encode()).into_owned();
        if args.json {
            let (name, count) = match event {
                GestureEvent::ModeChange => ("mode-change", None),
                GestureEvent::Command(n) => ("command", Some(n)),
            };
            let record = EventRecord {
                frame: frame_no,
                at_ms,
                event: name,
                count,
                wire,
            };
            println!("{}", serde_json::to_string(&record)?);
        } else {
            println!("frame {:>6}  {:>8} ms  {:<12} wire={:?}", frame_no, at_ms, event, wire);
        }
    }

    let stats = pipeline.stats();
    eprintln!(
        "replayed {} frames ({} with a hand): {} mode change(s), {} command(s)",
        stats.frames, stats.frames_with_hand, stats.mode_changes, stats.commands
    );
    Ok(())
}
