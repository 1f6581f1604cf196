//! In-memory progress counter (bytes done, ETA, rate).
//!
//! Consumers can compute rate = bytes_done / elapsed_secs and
//! ETA = (total_bytes - bytes_done) / rate from a snapshot.

use super::ProgressSink;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

/// Snapshot of download progress.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressStats {
    /// Bytes consumed so far.
    pub bytes_done: u64,
    /// Total size in bytes, once known.
    pub total_bytes: Option<u64>,
    /// Elapsed time since the counter was created or last reset (seconds).
    pub elapsed_secs: f64,
    pub reset_calls: u32,
    pub close_calls: u32,
}

impl ProgressStats {
    /// Download rate in bytes per second (0 if elapsed is 0).
    pub fn bytes_per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.bytes_done as f64 / self.elapsed_secs
    }

    /// Estimated seconds remaining (None if total unknown or rate is 0).
    pub fn eta_secs(&self) -> Option<f64> {
        let remaining = self.total_bytes?.saturating_sub(self.bytes_done);
        if remaining == 0 {
            return Some(0.0);
        }
        let rate = self.bytes_per_sec();
        if rate <= 0.0 {
            return None;
        }
        Some(remaining as f64 / rate)
    }

    /// Fraction complete in [0.0, 1.0] (0 while the total is unknown).
    pub fn fraction(&self) -> f64 {
        match self.total_bytes {
            None => 0.0,
            Some(0) => 1.0,
            Some(total) => (self.bytes_done as f64 / total as f64).min(1.0),
        }
    }
}

#[derive(Debug)]
struct State {
    bytes_done: u64,
    total_bytes: Option<u64>,
    started: Instant,
    reset_calls: u32,
    close_calls: u32,
}

/// Counting sink. Keep a [`CounterHandle`] to read it after handing the sink to `Progress`.
#[derive(Debug)]
pub struct Counter {
    state: Rc<RefCell<State>>,
}

/// Read side of a [`Counter`].
#[derive(Debug, Clone)]
pub struct CounterHandle {
    state: Rc<RefCell<State>>,
}

impl Counter {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(State {
                bytes_done: 0,
                total_bytes: None,
                started: Instant::now(),
                reset_calls: 0,
                close_calls: 0,
            })),
        }
    }

    pub fn handle(&self) -> CounterHandle {
        CounterHandle {
            state: Rc::clone(&self.state),
        }
    }
}

impl Default for Counter {
    fn default() -> Self {
        Self::new()
    }
}

impl CounterHandle {
    pub fn snapshot(&self) -> ProgressStats {
        let s = self.state.borrow();
        ProgressStats {
            bytes_done: s.bytes_done,
            total_bytes: s.total_bytes,
            elapsed_secs: s.started.elapsed().as_secs_f64(),
            reset_calls: s.reset_calls,
            close_calls: s.close_calls,
        }
    }
}

impl ProgressSink for Counter {
    fn set_total(&mut self, total: u64) {
        self.state.borrow_mut().total_bytes = Some(total);
    }

    fn total(&self) -> Option<u64> {
        self.state.borrow().total_bytes
    }

    fn update(&mut self, n: u64) {
        self.state.borrow_mut().bytes_done += n;
    }

    fn reset(&mut self) {
        let mut s = self.state.borrow_mut();
        s.bytes_done = 0;
        s.started = Instant::now();
        s.reset_calls += 1;
    }

    fn close(&mut self) {
        self.state.borrow_mut().close_calls += 1;
    }
}
