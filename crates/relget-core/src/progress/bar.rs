//! Terminal progress bar (indicatif).

use super::ProgressSink;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {binary_bytes_per_sec} {msg}";

/// Byte-counting bar on stderr, labelled with the asset name.
pub struct TerminalBar {
    bar: ProgressBar,
    total: Option<u64>,
}

impl TerminalBar {
    pub fn new(label: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_bar().template(TEMPLATE) {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar.set_message(label.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar, total: None }
    }

    /// A bar that draws nothing; used in tests and when output is redirected.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            total: None,
        }
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl ProgressSink for TerminalBar {
    fn set_total(&mut self, total: u64) {
        self.total = Some(total);
        self.bar.set_length(total);
    }

    fn total(&self) -> Option<u64> {
        self.total
    }

    fn update(&mut self, n: u64) {
        self.bar.inc(n);
    }

    fn reset(&mut self) {
        self.bar.set_position(0);
        self.bar.reset_eta();
    }

    fn close(&mut self) {
        self.bar.finish();
    }
}
