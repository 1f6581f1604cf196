//! Checksum command: compute SHA-256 of a file.

use anyhow::Result;
use relget_core::checksum;
use std::path::Path;

/// Compute and print SHA-256 of the given file, in `sha256sum --binary` format.
pub fn run_checksum(path: &Path) -> Result<()> {
    let digest = checksum::sha256_path(path)?;
    let name = path.file_name().unwrap_or(path.as_os_str());
    println!("{} *{}", digest, name.to_string_lossy());
    Ok(())
}
