//! Recorded geometry file source.
//!
//! A recording is JSON lines, one frame per line:
//!
//! ```text
//! # comment lines and blank lines are ignored
//! {"contour": [[0,300],[0,150],[25,0]], "defects": [[0,1,2,2000]]}
//! {}
//! ```
//!
//! A line without `contour` is a frame with no hand; a line without `defects`
//! is a hand for which the geometry library reported no defects.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use super::{FrameClock, GeometrySource, SourceStats};
use crate::frame::HandFrame;
use crate::geometry::{Contour, ConvexityDefect};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RecordedFrame {
    #[serde(default)]
    contour: Option<Contour>,
    #[serde(default)]
    defects: Option<Vec<ConvexityDefect>>,
}

/// Parse one recording line. Blank and `#` lines yield `None`.
fn parse_line(line: &str) -> Result<Option<RecordedFrame>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(trimmed)?))
}

pub struct FileSource {
    path: String,
    target_fps: u32,
    lines: Option<Lines<BufReader<File>>>,
    clock: FrameClock,
    line_no: usize,
    frame_count: u64,
    exhausted: bool,
}

impl FileSource {
    pub fn new(path: &str, target_fps: u32) -> Self {
        Self {
            path: path.to_string(),
            target_fps,
            lines: None,
            clock: FrameClock::new(target_fps),
            line_no: 0,
            frame_count: 0,
            exhausted: false,
        }
    }
}

impl GeometrySource for FileSource {
    fn connect(&mut self) -> Result<()> {
        let file = File::open(&self.path)
            .with_context(|| format!("failed to open recording {}", self.path))?;
        self.lines = Some(BufReader::new(file).lines());
        self.clock = FrameClock::new(self.target_fps);
        log::info!("FileSource: replaying {} at {} fps", self.path, self.target_fps);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<HandFrame>> {
        let lines = self
            .lines
            .as_mut()
            .ok_or_else(|| anyhow!("file source not connected"))?;
        for line in lines.by_ref() {
            self.line_no += 1;
            let line = line.with_context(|| format!("{}:{}: read failed", self.path, self.line_no))?;
            let Some(record) = parse_line(&line)
                .with_context(|| format!("{}:{}: invalid frame record", self.path, self.line_no))?
            else {
                continue;
            };
            self.frame_count += 1;
            return Ok(Some(HandFrame::new(
                record.contour,
                record.defects,
                self.clock.tick(),
            )));
        }
        self.exhausted = true;
        Ok(None)
    }

    fn is_healthy(&self) -> bool {
        self.lines.is_some() && !self.exhausted
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            url: self.path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parse_line_handles_comments_and_partial_records() {
        assert!(parse_line("").unwrap().is_none());
        assert!(parse_line("   # header").unwrap().is_none());

        let empty = parse_line("{}").unwrap().unwrap();
        assert!(empty.contour.is_none());
        assert!(empty.defects.is_none());

        let hand = parse_line(r#"{"contour": [[0,0],[10,0],[10,10]]}"#)
            .unwrap()
            .unwrap();
        assert_eq!(hand.contour.map(|c| c.len()), Some(3));
        assert!(hand.defects.is_none());

        assert!(parse_line(r#"{"contour": [[0,0]], "colour": 1}"#).is_err());
        assert!(parse_line("not json").is_err());
    }

    #[test]
    fn replays_frames_and_reports_bad_lines() {
        let mut file = tempfile::NamedTempFile::new().expect("temp recording");
        writeln!(file, "# two frames then garbage").unwrap();
        writeln!(file, "{{}}").unwrap();
        writeln!(file).unwrap();
        writeln!(
            file,
            r#"{{"contour": [[0,0],[10,0],[10,10]], "defects": [[0,1,2,500]]}}"#
        )
        .unwrap();
        writeln!(file, "{{\"contour\": 7}}").unwrap();

        let path = file.path().to_string_lossy().to_string();
        let mut source = FileSource::new(&path, 10);
        assert!(source.next_frame().is_err());
        source.connect().unwrap();

        let first = source.next_frame().unwrap().unwrap();
        assert!(first.contour.is_none());
        let second = source.next_frame().unwrap().unwrap();
        assert_eq!(second.defects().map(|d| d.len()), Some(1));
        assert_eq!(
            second.captured_at - first.captured_at,
            std::time::Duration::from_millis(100)
        );

        let err = source.next_frame().unwrap_err();
        assert!(format!("{err:#}").contains(":5: invalid frame record"));
        assert_eq!(source.stats().frames_captured, 2);
    }

    #[test]
    fn end_of_file_is_end_of_stream() {
        let file = tempfile::NamedTempFile::new().expect("temp recording");
        let path = file.path().to_string_lossy().to_string();
        let mut source = FileSource::new(&path, 30);
        source.connect().unwrap();
        assert!(source.next_frame().unwrap().is_none());
        assert!(!source.is_healthy());
    }

    #[test]
    fn missing_file_fails_to_connect() {
        let mut source = FileSource::new("/nonexistent/recording.jsonl", 30);
        assert!(source.connect().is_err());
    }
}
