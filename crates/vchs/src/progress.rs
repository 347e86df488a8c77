//! Step progress on stderr.
//!
//! A spinner shows the running workflow step; finished and failed steps are
//! printed above it with a status mark. Hidden in quiet mode and when stderr
//! is not a terminal.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use vchs_core::{CoreError, Step, StepObserver};

use crate::output::status_mark;

pub struct StepProgress {
    bar: ProgressBar,
    color: bool,
}

impl StepProgress {
    pub fn new(quiet: bool, color: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        };
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            bar.set_style(style);
        }
        if !bar.is_hidden() {
            bar.enable_steady_tick(Duration::from_millis(120));
        }
        Self { bar, color }
    }

    /// Clear the spinner once the workflow returns.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    fn report(&self, ok: bool, line: &str) {
        if self.bar.is_hidden() {
            return;
        }
        let mark = status_mark(ok, self.color);
        self.bar.suspend(|| eprintln!("{mark} {line}"));
    }
}

impl StepObserver for StepProgress {
    fn started(&self, step: Step) {
        self.bar.set_message(format!("{step}..."));
    }

    fn finished(&self, step: Step) {
        self.report(true, &step.to_string());
    }

    fn failed(&self, step: Step, error: &CoreError) {
        self.report(false, &format!("{step}: {error}"));
    }
}
