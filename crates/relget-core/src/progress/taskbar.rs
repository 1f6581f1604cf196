//! Taskbar progress through the `ESC ] 9 ; 4` terminal sequence.
//!
//! Windows Terminal and ConEmu (and several Linux terminals) turn
//! `ESC ] 9 ; 4 ; 1 ; <pct> BEL` into a taskbar/tab progress indicator.
//! `ESC ] 9 ; 4 ; 0 BEL` clears it.

use super::ProgressSink;
use std::io::{self, Write};

/// Writes the percentage whenever it changes; clears the indicator on close.
pub struct TaskbarIndicator<W: Write = io::Stderr> {
    out: W,
    total: Option<u64>,
    done: u64,
    last_pct: Option<u8>,
    closed: bool,
}

impl TaskbarIndicator<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> TaskbarIndicator<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            total: None,
            done: 0,
            last_pct: None,
            closed: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn percent(&self) -> Option<u8> {
        match self.total? {
            0 => Some(100),
            total => Some((self.done.min(total) * 100 / total) as u8),
        }
    }

    fn refresh(&mut self) {
        if self.closed {
            return;
        }
        let Some(pct) = self.percent() else {
            return;
        };
        if self.last_pct == Some(pct) {
            return;
        }
        self.last_pct = Some(pct);
        // Display only; a failed write must not fail the download.
        let _ = write!(self.out, "\x1b]9;4;1;{}\x07", pct);
        let _ = self.out.flush();
    }
}

impl<W: Write> ProgressSink for TaskbarIndicator<W> {
    fn set_total(&mut self, total: u64) {
        self.total = Some(total);
        self.refresh();
    }

    fn total(&self) -> Option<u64> {
        self.total
    }

    fn update(&mut self, n: u64) {
        self.done += n;
        self.refresh();
    }

    fn reset(&mut self) {
        self.done = 0;
        self.refresh();
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let _ = write!(self.out, "\x1b]9;4;0\x07");
        let _ = self.out.flush();
    }
}
