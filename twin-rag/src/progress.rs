//! Progress reporting for pipeline states.
//!
//! `NoopProgress` for tests and headless runs, `IndicatifProgress` for the CLI.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Per-call states of the answer pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Start,
    Retrieving,
    Assembling,
    Prompting,
    Generating,
}

impl PipelineState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Start => "validating question",
            Self::Retrieving => "embedding + retrieving",
            Self::Assembling => "assembling context",
            Self::Prompting => "building prompt",
            Self::Generating => "generating answer",
        }
    }
}

pub trait Progress: Send + Sync {
    /// Entered `state`.
    fn state(&self, _state: PipelineState) {}
    /// Replace the current message.
    fn message(&self, _msg: &str) {}
    /// Pipeline reached a terminal answer.
    fn finish(&self, _msg: &str) {}
}

#[derive(Default, Clone, Copy)]
pub struct NoopProgress;
impl Progress for NoopProgress {}

/// Indicatif spinner on stderr.
pub struct IndicatifProgress {
    pb: ProgressBar,
}

impl IndicatifProgress {
    pub fn spinner() -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("-\\|/ "),
        );
        pb.enable_steady_tick(Duration::from_millis(80));
        Self { pb }
    }
}

impl Progress for IndicatifProgress {
    fn state(&self, state: PipelineState) {
        self.pb.set_message(state.label());
    }
    fn message(&self, msg: &str) {
        self.pb.set_message(msg.to_string());
    }
    fn finish(&self, _msg: &str) {
        self.pb.finish_and_clear();
    }
}
