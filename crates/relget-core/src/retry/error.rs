//! Transfer error type for retry classification.

use std::fmt;

/// Error returned by a single GET attempt (curl failure, HTTP error, short body, or storage failure).
/// Kept separate from `DownloadError` so each attempt can be classified before deciding to retry.
#[derive(Debug)]
pub enum TransferError {
    /// Curl reported an error (timeout, connection, etc.).
    Curl(curl::Error),
    /// HTTP response had a non-2xx status.
    Http(u32),
    /// Transfer completed but the destination holds fewer bytes than the established total
    /// (e.g. server closed early). Retried from the current position.
    PartialTransfer { expected: u64, received: u64 },
    /// Destination write failed (e.g. disk full, permission denied). Not retried.
    Storage(std::io::Error),
    /// Request could not be built (malformed URL or header). Not retried.
    InvalidRequest(String),
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferError::Curl(e) => write!(f, "{}", e),
            TransferError::Http(code) => write!(f, "HTTP {}", code),
            TransferError::PartialTransfer { expected, received } => {
                write!(f, "partial transfer: expected {} bytes, got {}", expected, received)
            }
            TransferError::Storage(e) => write!(f, "storage: {}", e),
            TransferError::InvalidRequest(msg) => write!(f, "invalid request: {}", msg),
        }
    }
}

impl std::error::Error for TransferError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransferError::Curl(e) => Some(e),
            TransferError::Storage(e) => Some(e),
            TransferError::Http(_)
            | TransferError::PartialTransfer { .. }
            | TransferError::InvalidRequest(_) => None,
        }
    }
}

impl From<curl::Error> for TransferError {
    fn from(e: curl::Error) -> Self {
        TransferError::Curl(e)
    }
}
