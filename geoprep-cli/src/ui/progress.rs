//! Progress display for downloads and stage runs.

use std::time::Duration;

use console::style;
use geoprep::acquisition::AcquisitionEvent;
use geoprep::stages::{StageEvent, StageOutcome};
use indicatif::{ProgressBar, ProgressStyle};

const TICK: Duration = Duration::from_millis(120);

/// Overall bar over a batch of downloads.
///
/// Events may arrive from worker threads; `ProgressBar` is internally
/// synchronized.
pub struct AcquisitionProgress {
    bar: ProgressBar,
}

impl AcquisitionProgress {
    pub fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} [{elapsed_precise}] {wide_bar:.cyan/blue} {pos}/{len} {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏ "),
        );
        bar.enable_steady_tick(TICK);
        Self { bar }
    }

    pub fn handle(&self, event: &AcquisitionEvent) {
        match event {
            AcquisitionEvent::Started { id, .. } => {
                self.bar.set_message(id.clone());
            }
            AcquisitionEvent::Bytes {
                downloaded, total, ..
            } => {
                let done = indicatif::HumanBytes(*downloaded);
                if *total > 0 {
                    self.bar
                        .set_message(format!("{} / {}", done, indicatif::HumanBytes(*total)));
                } else {
                    self.bar.set_message(done.to_string());
                }
            }
            AcquisitionEvent::Finished { result, .. } => {
                if result.outcome.is_failure() {
                    self.bar.println(format!(
                        "  {} {} {}",
                        style("✗").red(),
                        result.id,
                        result.outcome
                    ));
                }
                self.bar.inc(1);
            }
            AcquisitionEvent::Waiting { delay } => {
                self.bar
                    .set_message(format!("waiting {} ms", delay.as_millis()));
            }
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

/// Spinner that prints one line per finished stage.
pub struct StageProgress {
    spinner: ProgressBar,
}

impl Default for StageProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl StageProgress {
    pub fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(TICK);
        Self { spinner }
    }

    pub fn handle(&self, event: &StageEvent) {
        match event {
            StageEvent::Started { name, .. } => {
                self.spinner.set_message(format!("{}...", name));
            }
            StageEvent::Finished { result } => {
                let marker = match &result.outcome {
                    StageOutcome::Succeeded { reused: true } => style("=").dim(),
                    StageOutcome::Succeeded { reused: false } => style("✓").green(),
                    StageOutcome::Failed { .. } => style("✗").red(),
                    StageOutcome::SkippedDependencyFailed { .. } => style("-").yellow(),
                    StageOutcome::Cancelled => style("!").yellow(),
                };
                self.spinner
                    .println(format!("  {} {:<28} {}", marker, result.name, result.outcome));
            }
        }
    }

    /// Hide the spinner while `f` writes to or reads from the terminal.
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        self.spinner.suspend(f)
    }

    pub fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}
