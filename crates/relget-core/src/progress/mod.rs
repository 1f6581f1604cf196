//! Progress reporting for downloads.
//!
//! Sinks are plain counters: they accept a total, byte increments, a reset and
//! a close. Whether a newly reported total is consistent with the previous one
//! is decided by the downloader, never by a sink. [`Progress`] drives any
//! number of sinks from the same byte stream.

mod bar;
mod counter;
mod taskbar;

pub use bar::TerminalBar;
pub use counter::{Counter, CounterHandle, ProgressStats};
pub use taskbar::TaskbarIndicator;

/// Receiver of download progress.
pub trait ProgressSink {
    /// Set the expected total in bytes.
    fn set_total(&mut self, total: u64);
    fn total(&self) -> Option<u64>;
    /// Add `n` consumed bytes.
    fn update(&mut self, n: u64);
    /// Zero the consumed counter (soft restart).
    fn reset(&mut self);
    /// Release display resources. Called once, when the download returns.
    fn close(&mut self);
}

/// Broadcasts every call identically to all attached sinks.
#[derive(Default)]
pub struct Progress {
    sinks: Vec<Box<dyn ProgressSink>>,
    total: Option<u64>,
    consumed: u64,
    closed: bool,
}

impl Progress {
    /// No sinks attached; only the internal counter is kept.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: impl ProgressSink + 'static) -> Self {
        self.attach(sink);
        self
    }

    pub fn attach(&mut self, sink: impl ProgressSink + 'static) {
        let mut sink: Box<dyn ProgressSink> = Box::new(sink);
        if let Some(total) = self.total {
            sink.set_total(total);
        }
        if self.consumed > 0 {
            sink.update(self.consumed);
        }
        self.sinks.push(sink);
    }

    /// Terminal bar and taskbar indicator when stderr is a terminal; none otherwise.
    pub fn for_terminal(label: &str, total: Option<u64>) -> Self {
        let mut progress = Progress::new();
        if console::Term::stderr().features().is_attended() {
            progress.attach(TerminalBar::new(label));
            progress.attach(TaskbarIndicator::stderr());
        }
        if let Some(total) = total {
            progress.set_total(total);
        }
        progress
    }

    pub fn set_total(&mut self, total: u64) {
        self.total = Some(total);
        for sink in &mut self.sinks {
            sink.set_total(total);
        }
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Bytes reported so far.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    pub fn update(&mut self, n: u64) {
        if n == 0 {
            return;
        }
        self.consumed += n;
        for sink in &mut self.sinks {
            sink.update(n);
        }
    }

    /// Bring the consumed count up to `position` (bytes already in the destination).
    pub fn catch_up(&mut self, position: u64) {
        if position > self.consumed {
            self.update(position - self.consumed);
        }
    }

    pub fn reset(&mut self) {
        self.consumed = 0;
        for sink in &mut self.sinks {
            sink.reset();
        }
    }

    /// Close every sink. Further calls are no-ops.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        for sink in &mut self.sinks {
            sink.close();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        self.close();
    }
}
