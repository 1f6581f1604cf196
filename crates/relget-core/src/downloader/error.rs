//! Download error taxonomy and the per-attempt failure chain.

use crate::retry::TransferError;
use std::fmt;

/// One failed GET, linked to the failure of the attempt before it.
#[derive(Debug)]
pub struct AttemptFailure {
    /// 1-based attempt number.
    pub attempt: u32,
    pub error: TransferError,
    pub previous: Option<Box<AttemptFailure>>,
}

impl AttemptFailure {
    pub fn new(attempt: u32, error: TransferError, previous: Option<AttemptFailure>) -> Self {
        Self {
            attempt,
            error,
            previous: previous.map(Box::new),
        }
    }

    /// This failure followed by every earlier one, newest first.
    pub fn chain(&self) -> impl Iterator<Item = &AttemptFailure> {
        std::iter::successors(Some(self), |f| f.previous.as_deref())
    }

    pub fn depth(&self) -> usize {
        self.chain().count()
    }
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attempt {}: {}", self.attempt, self.error)
    }
}

impl std::error::Error for AttemptFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.previous {
            Some(prev) => Some(prev.as_ref()),
            None => Some(&self.error),
        }
    }
}

/// Why a download gave up. Every variant is terminal; nothing is retried past this point.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// Non-transient failure (4xx status, storage error, bad request).
    #[error("transfer failed: {0}")]
    Transfer(#[source] AttemptFailure),

    /// The server's Content-Length contradicts the established total.
    #[error(
        "expected {expected} bytes left, got {reported} from the Content-Length header (at offset {position})"
    )]
    Integrity {
        expected: u64,
        reported: u64,
        position: u64,
    },

    /// The server sent more bytes than the established total.
    #[error("received {received} bytes of a {total}-byte asset")]
    Overrun { total: u64, received: u64 },

    /// Only transient failures were seen and the attempt cap was reached.
    #[error("giving up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: AttemptFailure,
    },

    /// Retries were requested for a destination that cannot resume.
    #[error("destination is not seekable; use a single-attempt policy to stream")]
    Unseekable,

    /// Seeking or truncating the destination failed.
    #[error("destination I/O failed")]
    Storage(#[from] std::io::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl DownloadError {
    /// The recorded attempt chain, for failures that went through the network.
    pub fn attempts(&self) -> Option<&AttemptFailure> {
        match self {
            DownloadError::Transfer(f) => Some(f),
            DownloadError::RetriesExhausted { last, .. } => Some(last),
            _ => None,
        }
    }

    /// HTTP status of the final attempt, if it failed with one.
    pub fn http_status(&self) -> Option<u32> {
        match self.attempts().map(|f| &f.error) {
            Some(TransferError::Http(code)) => Some(*code),
            _ => None,
        }
    }
}
