//! Content-Length reconciliation: what a response's declared length means
//! given what the destination already holds.

/// Outcome of comparing a response's length against the transfer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconcile {
    /// No total was known; this response establishes it.
    Adopt { total: u64 },
    /// Declared length is exactly what is still missing.
    Match,
    /// The server sent the whole asset again while bytes are already present.
    /// Rewind, stop asking for ranges, and start over.
    SoftRestart,
    /// Declared length is inconsistent with the established total.
    Mismatch { expected: u64, reported: u64 },
    /// No Content-Length; stream until the server closes.
    Unknown,
}

/// Decide how to treat a response.
///
/// `total` is the established asset size (from release metadata or an earlier
/// response), `position` the bytes already in the destination, `status` the
/// HTTP status and `reported` the response's Content-Length.
///
/// With a known total the decision uses lengths only. Without one, the status
/// is the only signal that a full body arrived in place of the requested range.
pub fn reconcile(total: Option<u64>, position: u64, status: u32, reported: Option<u64>) -> Reconcile {
    let partial = status == 206;
    match (total, reported) {
        (_, None) => {
            if position > 0 && !partial {
                Reconcile::SoftRestart
            } else {
                Reconcile::Unknown
            }
        }
        (None, Some(len)) => {
            if position > 0 && !partial {
                Reconcile::SoftRestart
            } else {
                Reconcile::Adopt {
                    total: position + len,
                }
            }
        }
        (Some(total), Some(len)) => {
            let remaining = total.saturating_sub(position);
            if len == remaining {
                Reconcile::Match
            } else if position > 0 && len == total {
                Reconcile::SoftRestart
            } else {
                Reconcile::Mismatch {
                    expected: remaining,
                    reported: len,
                }
            }
        }
    }
}
