//! Low-level transfer primitive: one HTTP GET with caller-supplied headers.
//!
//! The downloader never talks to curl directly; it drives a [`Transport`] and
//! receives the response through a [`BodySink`]. Tests substitute a scripted
//! transport.

mod easy;
mod head;

pub use easy::CurlTransport;
pub use head::{parse_head, ResponseHead};

use crate::retry::TransferError;
use std::ops::ControlFlow;

/// Receives one response: headers first, then body chunks in order.
pub trait BodySink {
    /// Called once per response, before any body chunk (after redirects are followed).
    fn head(&mut self, head: &ResponseHead) -> ControlFlow<()>;
    /// Called for each body chunk.
    fn chunk(&mut self, data: &[u8]) -> ControlFlow<()>;
}

/// How a GET ended when the transport itself did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Body fully received.
    Complete,
    /// The sink returned `ControlFlow::Break`; the connection was dropped.
    Stopped,
}

/// One GET against `url` with the given headers.
///
/// Returns `Err` only for transport failures (connect, timeout, reset). HTTP
/// error statuses are delivered through [`BodySink::head`] like any other response.
pub trait Transport {
    fn get(
        &mut self,
        url: &str,
        headers: &[(String, String)],
        body: &mut dyn BodySink,
    ) -> Result<Delivery, TransferError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn get(
        &mut self,
        url: &str,
        headers: &[(String, String)],
        body: &mut dyn BodySink,
    ) -> Result<Delivery, TransferError> {
        (**self).get(url, headers, body)
    }
}
