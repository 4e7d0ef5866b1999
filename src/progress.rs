//! Progress indicators for the statefulstring CLI

use colored::Colorize;
use declarative::{ApplyResult, ProgressCallback, StepOp, Urn};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// A progress bar with the step count and a message
pub fn bar(len: u64, msg: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// A spinner for work of unknown length
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Symbol shown for a finished step
pub fn result_symbol(result: &ApplyResult) -> &'static str {
    match result {
        ApplyResult::NoChange => "○",
        ApplyResult::Created
        | ApplyResult::Updated
        | ApplyResult::Replaced
        | ApplyResult::Deleted => "✓",
        ApplyResult::Failed { .. } => "✗",
        ApplyResult::Skipped { .. } => "⊘",
    }
}

// ============================================================================
// Engine Progress
// ============================================================================

/// Drives a progress bar from engine callbacks
pub struct ApplyProgress {
    bar: Option<ProgressBar>,
    hidden: bool,
}

impl ApplyProgress {
    pub fn new(quiet: bool) -> Self {
        Self {
            bar: None,
            hidden: quiet,
        }
    }
}

impl ProgressCallback for ApplyProgress {
    fn on_batch_start(&mut self, count: usize, preview: bool) {
        let label = if preview { "Previewing" } else { "Applying" };
        let pb = if self.hidden {
            ProgressBar::hidden()
        } else {
            bar(count as u64, label)
        };
        self.bar = Some(pb);
    }

    fn on_step_start(&mut self, urn: &Urn, op: StepOp) {
        if let Some(pb) = &self.bar {
            pb.set_message(format!("{} {}", op.symbol().trim(), urn.name()));
        }
    }

    fn on_step_complete(&mut self, urn: &Urn, _op: StepOp, result: &ApplyResult) {
        if let Some(pb) = &self.bar {
            pb.set_message(format!("{} {}", result_symbol(result), urn.name()));
            pb.inc(1);
            if let ApplyResult::Failed { error } = result {
                pb.println(format!("  {} {}: {}", "✗".red(), urn.name(), error));
            }
        }
    }

    fn on_batch_complete(&mut self) {
        if let Some(pb) = self.bar.take() {
            pb.finish_and_clear();
        }
    }
}
