use crate::ports::outbound::ProgressReporter;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::sync::{Mutex, MutexGuard};

const PROGRESS_TEMPLATE: &str =
    "   {spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) - {msg}";

/// StderrProgressReporter adapter for reporting progress to stderr
///
/// This adapter implements the ProgressReporter port, writing progress
/// information to stderr so it doesn't interfere with stdout output.
/// Uses indicatif for rich progress bar display. One bar is shown per
/// compilation run; it is cleared when the run completes or fails.
pub struct StderrProgressReporter {
    progress_bar: Mutex<Option<ProgressBar>>,
}

impl StderrProgressReporter {
    pub fn new() -> Self {
        Self {
            progress_bar: Mutex::new(None),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<ProgressBar>> {
        // A panic while holding the lock leaves nothing to repair
        self.progress_bar
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn get_or_create_progress_bar(&self, total: usize) -> ProgressBar {
        let mut slot = self.slot();
        if let Some(pb) = slot.as_ref() {
            return pb.clone();
        }

        let pb = ProgressBar::new(total as u64);
        match ProgressStyle::default_bar().template(PROGRESS_TEMPLATE) {
            Ok(style) => pb.set_style(style.progress_chars("=>-")),
            Err(e) => tracing::debug!(error = %e, "invalid progress bar template"),
        }
        *slot = Some(pb.clone());
        pb
    }

    fn finish_progress_bar(&self) {
        if let Some(pb) = self.slot().take() {
            pb.finish_and_clear();
        }
    }
}

impl Default for StderrProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for StderrProgressReporter {
    fn report(&self, message: &str) {
        eprintln!("{}", message);
    }

    fn report_progress(&self, current: usize, total: usize, message: Option<&str>) {
        let pb = self.get_or_create_progress_bar(total);
        pb.set_position(current as u64);
        if let Some(msg) = message {
            pb.set_message(msg.to_string());
        }
    }

    fn report_error(&self, message: &str) {
        self.finish_progress_bar();
        eprintln!("{}", message.yellow());
    }

    fn report_completion(&self, message: &str) {
        self.finish_progress_bar();
        eprintln!();
        eprintln!("{}", message.green());
    }
}

/// SilentProgressReporter adapter discarding every message
///
/// Used by the long-running service, where structured logs already
/// carry the run summaries.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgressReporter;

impl ProgressReporter for SilentProgressReporter {
    fn report(&self, _message: &str) {}

    fn report_progress(&self, _current: usize, _total: usize, _message: Option<&str>) {}

    fn report_error(&self, _message: &str) {}

    fn report_completion(&self, _message: &str) {}
}
