//! Terminal presentation of the per-frame gesture status.
//!
//! Purely observational: nothing here feeds back into the pipeline.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

use crate::gesture::GestureStatus;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiMode {
    Auto,
    Plain,
    Pretty,
}

impl UiMode {
    pub fn parse(flag: Option<&str>) -> Self {
        match flag {
            Some("plain") => UiMode::Plain,
            Some("pretty") => UiMode::Pretty,
            _ => UiMode::Auto,
        }
    }

    fn use_pretty(self, is_tty: bool) -> bool {
        is_tty
            && match self {
                UiMode::Pretty | UiMode::Auto => true,
                UiMode::Plain => false,
            }
    }
}

/// Shows the current gesture status on stderr.
///
/// Pretty mode keeps a single spinner line updated every frame; plain mode
/// prints a line only when the status text changes.
pub struct StatusLine {
    spinner: Option<ProgressBar>,
    last: Option<String>,
}

impl StatusLine {
    pub fn new(mode: UiMode, is_tty: bool) -> Self {
        let spinner = mode.use_pretty(is_tty).then(|| {
            let spinner = ProgressBar::new_spinner();
            spinner.set_draw_target(ProgressDrawTarget::stderr());
            spinner.enable_steady_tick(Duration::from_millis(120));
            let style = ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            spinner.set_style(style);
            spinner
        });
        Self {
            spinner,
            last: None,
        }
    }

    /// Record this frame's status. Returns true when the displayed text changed.
    pub fn update(&mut self, status: &GestureStatus) -> bool {
        let text = status.to_string();
        if self.last.as_deref() == Some(text.as_str()) {
            return false;
        }
        match &self.spinner {
            Some(spinner) => spinner.set_message(text.clone()),
            None => eprintln!("{}", text),
        }
        self.last = Some(text);
        true
    }

    pub fn finish(self, message: &str) {
        match self.spinner {
            Some(spinner) => spinner.finish_with_message(message.to_string()),
            None => eprintln!("{}", message),
        }
    }
}
