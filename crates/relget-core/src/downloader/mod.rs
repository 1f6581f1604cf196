//! Resumable downloader engine.
//!
//! Fetches one asset into a [`Destination`] with a bounded attempt loop.
//! Every attempt resumes from the bytes already present (`Range: bytes=N-`)
//! while the server is believed to honor ranges. Each response's
//! Content-Length is reconciled against the established total:
//!
//! - it matches the missing length: stream the body;
//! - it is the full asset length while bytes are present: soft restart
//!   (rewind, stop sending `Range`, try again without counting a failure);
//! - anything else: integrity error, no retries.
//!
//! Transport failures are classified by [`crate::retry`]; transient ones are
//! retried with backoff, each failure chained to the previous one.

mod attempt;
mod destination;
mod error;
mod reconcile;


pub use destination::{Destination, Unseekable};
pub use error::{AttemptFailure, DownloadError};
pub use reconcile::{reconcile, Reconcile};

use crate::progress::Progress;
use crate::retry::{classify, RetryDecision, RetryPolicy};
use crate::transport::Transport;
use attempt::{Attempt, TransferState, Verdict};

/// Headers the downloader manages itself; callers cannot set them.
const MANAGED_HEADERS: [&str; 2] = ["range", "accept-ranges"];

/// What to fetch. Immutable for the lifetime of one download.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    url: String,
    expected_size: Option<u64>,
    headers: Vec<(String, String)>,
}

impl DownloadRequest {
    /// Fails when `url` is not an absolute URL.
    pub fn new(url: &str) -> Result<Self, DownloadError> {
        url::Url::parse(url).map_err(|e| DownloadError::InvalidRequest(format!("{}: {}", url, e)))?;
        Ok(Self {
            url: url.to_string(),
            expected_size: None,
            headers: Vec::new(),
        })
    }

    /// Size declared by release metadata. Every response must agree with it.
    pub fn with_size(mut self, size: u64) -> Self {
        self.expected_size = Some(size);
        self
    }

    /// Add a request header. `Range` and `Accept-Ranges` are ignored.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        let name = name.trim();
        if MANAGED_HEADERS.iter().any(|m| name.eq_ignore_ascii_case(m)) {
            tracing::warn!("ignoring caller-supplied {} header", name);
            return self;
        }
        self.headers.push((name.to_string(), value.trim().to_string()));
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn expected_size(&self) -> Option<u64> {
        self.expected_size
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Last non-empty path segment of the URL, used as a default file name.
    pub fn file_name(&self) -> Option<String> {
        let url = url::Url::parse(&self.url).ok()?;
        let name = url.path_segments()?.rev().find(|s| !s.is_empty())?;
        Some(name.to_string())
    }

    fn headers_for(&self, range_start: Option<u64>) -> Vec<(String, String)> {
        let mut headers = self.headers.clone();
        if let Some(start) = range_start {
            headers.push(("Range".to_string(), format!("bytes={}-", start)));
        }
        headers
    }
}

/// Summary of a finished download.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadReport {
    /// Asset size; the destination holds exactly this many bytes.
    pub size: u64,
    /// Body bytes received by this call (excludes bytes that were already present).
    pub transferred: u64,
    /// GET requests issued.
    pub attempts: u32,
    /// Soft restarts (server ignored `Range`).
    pub restarts: u32,
}

/// Runs downloads over a transport with a retry policy.
pub struct Downloader<T> {
    transport: T,
    policy: RetryPolicy,
}

impl<T: Transport> Downloader<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Download `request` into `dest`, resuming from the bytes it already holds.
    ///
    /// `progress` is closed before returning, whatever the outcome.
    pub fn download<D: Destination + ?Sized>(
        &mut self,
        request: &DownloadRequest,
        dest: &mut D,
        progress: &mut Progress,
    ) -> Result<DownloadReport, DownloadError> {
        let result = self.run(request, dest, progress);
        progress.close();
        if let Err(e) = &result {
            tracing::warn!(url = %request.url, "download failed: {}", e);
        }
        result
    }

    fn run<D: Destination + ?Sized>(
        &mut self,
        request: &DownloadRequest,
        dest: &mut D,
        progress: &mut Progress,
    ) -> Result<DownloadReport, DownloadError> {
        let seekable = dest.resume_offset()?.is_some();
        if !seekable && self.policy.max_attempts > 1 {
            return Err(DownloadError::Unseekable);
        }

        let mut state = TransferState::new(request.expected_size);
        if let Some(total) = state.total {
            progress.set_total(total);
        }
        let mut report = DownloadReport::default();
        let mut last_failure: Option<AttemptFailure> = None;
        let mut failed = 0u32;

        loop {
            state.position = dest.resume_offset()?.unwrap_or(0);
            if let Some(total) = state.total {
                if state.position > total {
                    tracing::warn!(
                        position = state.position,
                        total,
                        "destination is longer than the asset; starting over"
                    );
                    dest.reset_to_origin()?;
                    state.position = 0;
                    progress.reset();
                }
            }
            if !state.accept_ranges && state.position > 0 {
                // Ranges are off: a retry re-fetches the whole body, so start it from zero.
                dest.reset_to_origin()?;
                state.position = 0;
                progress.reset();
            }
            progress.catch_up(state.position);

            let headers = request.headers_for(state.range_start());
            tracing::debug!(
                url = %request.url,
                position = state.position,
                ranged = state.range_start().is_some(),
                "GET attempt {}",
                report.attempts + 1
            );
            report.attempts += 1;

            let mut attempt = Attempt::new(&mut state, dest, progress);
            let delivery = self.transport.get(&request.url, &headers, &mut attempt);
            report.transferred += attempt.received();

            match attempt.finish(delivery) {
                Verdict::Complete => {
                    report.size = state.position;
                    tracing::info!(
                        url = %request.url,
                        size = report.size,
                        attempts = report.attempts,
                        "download complete"
                    );
                    return Ok(report);
                }
                Verdict::SoftRestart => {
                    tracing::warn!(
                        position = state.position,
                        "server sent the full asset instead of the requested range; restarting"
                    );
                    state.accept_ranges = false;
                    dest.reset_to_origin()?;
                    state.position = 0;
                    progress.reset();
                    report.restarts += 1;
                }
                Verdict::Fatal(e) => return Err(e),
                Verdict::Failed(error) => {
                    failed += 1;
                    let kind = classify(&error);
                    let failure = AttemptFailure::new(failed, error, last_failure.take());
                    match self.policy.decide(failed, kind) {
                        RetryDecision::RetryAfter(delay) => {
                            tracing::warn!(
                                position = state.position,
                                "{}; retrying in {:?}",
                                failure,
                                delay
                            );
                            std::thread::sleep(delay);
                            last_failure = Some(failure);
                        }
                        RetryDecision::NoRetry if kind.is_transient() => {
                            return Err(DownloadError::RetriesExhausted {
                                attempts: failed,
                                last: failure,
                            });
                        }
                        RetryDecision::NoRetry => return Err(DownloadError::Transfer(failure)),
                    }
                }
            }
        }
    }
}
