//! Digest command: read a published `.sha256` file for one asset.

use anyhow::Result;
use relget_core::checksum;
use std::path::Path;

pub fn run_digest(file: &Path, asset: &str) -> Result<()> {
    let digest = checksum::extract_file(file, asset)?;
    println!("{}", digest.hex());
    Ok(())
}
