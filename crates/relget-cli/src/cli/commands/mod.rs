//! CLI command handlers. Each command is in its own file.

mod checksum;
mod digest;
mod download;
mod release;

pub use checksum::run_checksum;
pub use digest::run_digest;
pub use download::run_download;
pub use release::run_release;
