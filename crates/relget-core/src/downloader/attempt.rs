//! One GET attempt: the `BodySink` that reconciles the response head and
//! streams the body into the destination.

use super::destination::Destination;
use super::error::DownloadError;
use super::reconcile::{reconcile, Reconcile};
use crate::progress::Progress;
use crate::retry::TransferError;
use crate::transport::{BodySink, Delivery, ResponseHead};
use std::ops::ControlFlow;

/// State carried between attempts of one download.
#[derive(Debug, Clone)]
pub(super) struct TransferState {
    /// Asset bytes already in the destination.
    pub position: u64,
    /// Established asset size.
    pub total: Option<u64>,
    /// Whether the server is still believed to honor `Range`.
    pub accept_ranges: bool,
}

impl TransferState {
    pub fn new(total: Option<u64>) -> Self {
        Self {
            position: 0,
            total,
            accept_ranges: true,
        }
    }

    /// Offset to request with `Range: bytes=<offset>-`, if any.
    pub fn range_start(&self) -> Option<u64> {
        (self.position > 0 && self.accept_ranges).then_some(self.position)
    }
}

/// How an attempt ended, from the downloader's point of view.
#[derive(Debug)]
pub(super) enum Verdict {
    /// Destination holds the whole asset.
    Complete,
    /// Full body sent in place of the requested range; rewind and retry.
    SoftRestart,
    /// Failed; classify and maybe retry.
    Failed(TransferError),
    /// Stop now, no retries.
    Fatal(DownloadError),
}

pub(super) struct Attempt<'a, D: Destination + ?Sized> {
    state: &'a mut TransferState,
    dest: &'a mut D,
    progress: &'a mut Progress,
    received: u64,
    verdict: Option<Verdict>,
}

impl<'a, D: Destination + ?Sized> Attempt<'a, D> {
    pub fn new(state: &'a mut TransferState, dest: &'a mut D, progress: &'a mut Progress) -> Self {
        Self {
            state,
            dest,
            progress,
            received: 0,
            verdict: None,
        }
    }

    /// Body bytes written during this attempt.
    pub fn received(&self) -> u64 {
        self.received
    }

    fn stop(&mut self, verdict: Verdict) -> ControlFlow<()> {
        self.verdict = Some(verdict);
        ControlFlow::Break(())
    }

    /// Combine what the sink saw with how the transport finished.
    pub fn finish(mut self, delivery: Result<Delivery, TransferError>) -> Verdict {
        if let Some(verdict) = self.verdict.take() {
            return verdict;
        }
        match delivery {
            Err(e) => Verdict::Failed(e),
            Ok(Delivery::Stopped) => Verdict::Failed(TransferError::PartialTransfer {
                expected: self.state.total.unwrap_or(self.state.position),
                received: self.state.position,
            }),
            Ok(Delivery::Complete) => {
                if let Err(e) = self.dest.flush() {
                    return Verdict::Failed(TransferError::Storage(e));
                }
                match self.state.total {
                    Some(total) if self.state.position != total => {
                        Verdict::Failed(TransferError::PartialTransfer {
                            expected: total,
                            received: self.state.position,
                        })
                    }
                    Some(_) => Verdict::Complete,
                    None => {
                        // Length was never declared; whatever arrived is the asset.
                        self.state.total = Some(self.state.position);
                        self.progress.set_total(self.state.position);
                        Verdict::Complete
                    }
                }
            }
        }
    }
}

impl<D: Destination + ?Sized> BodySink for Attempt<'_, D> {
    fn head(&mut self, head: &ResponseHead) -> ControlFlow<()> {
        let position = self.state.position;

        if !head.is_success() {
            // Asked for bytes past the end of a destination that is already complete.
            if head.status == 416 && position > 0 {
                let total = self.state.total.or(head.instance_length);
                if total == Some(position) {
                    if self.state.total.is_none() {
                        tracing::debug!(total = position, "asset size taken from Content-Range");
                        self.state.total = Some(position);
                        self.progress.set_total(position);
                    }
                    return self.stop(Verdict::Complete);
                }
            }
            return self.stop(Verdict::Failed(TransferError::Http(head.status)));
        }

        match reconcile(self.state.total, position, head.status, head.content_length) {
            Reconcile::Adopt { total } => {
                tracing::debug!(total, position, "asset size taken from Content-Length");
                self.state.total = Some(total);
                self.progress.set_total(total);
            }
            Reconcile::Match => {
                if self.progress.total().is_none() {
                    if let Some(total) = self.state.total {
                        self.progress.set_total(total);
                    }
                }
            }
            Reconcile::Unknown => {
                tracing::debug!(position, "response has no Content-Length");
            }
            Reconcile::SoftRestart => return self.stop(Verdict::SoftRestart),
            Reconcile::Mismatch { expected, reported } => {
                return self.stop(Verdict::Fatal(DownloadError::Integrity {
                    expected,
                    reported,
                    position,
                }));
            }
        }
        ControlFlow::Continue(())
    }

    fn chunk(&mut self, data: &[u8]) -> ControlFlow<()> {
        let n = data.len() as u64;
        if let Some(total) = self.state.total {
            if self.state.position + n > total {
                return self.stop(Verdict::Fatal(DownloadError::Overrun {
                    total,
                    received: self.state.position + n,
                }));
            }
        }
        if let Err(e) = self.dest.write_all(data) {
            return self.stop(Verdict::Failed(TransferError::Storage(e)));
        }
        self.state.position += n;
        self.received += n;
        self.progress.update(n);
        ControlFlow::Continue(())
    }
}
