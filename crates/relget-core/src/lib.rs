//! Resumable, checksum-verified downloads of release assets.

pub mod checksum;
pub mod config;
pub mod downloader;
pub mod fetch;
pub mod logging;
pub mod progress;
pub mod release;
pub mod retry;
pub mod transport;
