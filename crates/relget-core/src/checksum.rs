//! Checksum files and SHA-256 verification.
//!
//! A release publishes `<asset>.sha256` next to each asset, containing exactly
//! one line `<64 lowercase hex> *<asset>\n`. The file is parsed once and
//! deleted; only the digest is kept.

use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

const BUF_SIZE: usize = 64 * 1024;
const HEX_LEN: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum ChecksumError {
    /// The checksum file is not exactly `<hex> *<asset>\n`. Carries the raw contents.
    #[error("malformed checksum file for {asset}: {contents:?}")]
    Format { asset: String, contents: String },

    #[error("SHA-256 mismatch for {}: expected {expected}, got {actual}", path.display())]
    Mismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> ChecksumError + '_ {
    move |source| ChecksumError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// SHA-256 published for one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedDigest {
    hex: String,
    asset: String,
}

impl ExpectedDigest {
    /// 64 lowercase hex characters.
    pub fn hex(&self) -> &str {
        &self.hex
    }

    /// Asset name the digest was published for.
    pub fn asset(&self) -> &str {
        &self.asset
    }

    /// Hash `path` and compare.
    pub fn verify_file(&self, path: &Path) -> Result<(), ChecksumError> {
        let actual = sha256_path(path)?;
        if actual != self.hex {
            return Err(ChecksumError::Mismatch {
                path: path.to_path_buf(),
                expected: self.hex.clone(),
                actual,
            });
        }
        tracing::debug!(asset = %self.asset, "sha256 verified");
        Ok(())
    }
}

/// Parse checksum file contents for `asset`.
///
/// Accepts exactly `^[0-9a-f]{64} \*<asset>\n$`; nothing else is tolerated
/// (no uppercase hex, no text-mode separator, no extra lines).
pub fn extract(contents: &[u8], asset: &str) -> Result<ExpectedDigest, ChecksumError> {
    let malformed = || ChecksumError::Format {
        asset: asset.to_string(),
        contents: String::from_utf8_lossy(contents).into_owned(),
    };

    if contents.len() < HEX_LEN {
        return Err(malformed());
    }
    let (hex, rest) = contents.split_at(HEX_LEN);
    if !hex.iter().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        return Err(malformed());
    }
    let name = rest
        .strip_prefix(b" *")
        .and_then(|r| r.strip_suffix(b"\n"))
        .ok_or_else(malformed)?;
    if name != asset.as_bytes() {
        return Err(malformed());
    }

    Ok(ExpectedDigest {
        // Checked above: ASCII hex digits only.
        hex: String::from_utf8_lossy(hex).into_owned(),
        asset: asset.to_string(),
    })
}

/// Read and parse a downloaded checksum file, then delete it.
///
/// The file is removed whether or not it parses.
pub fn extract_file(path: &Path, asset: &str) -> Result<ExpectedDigest, ChecksumError> {
    let read = fs::read(path).map_err(io_err(path));
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            tracing::warn!("could not remove {}: {}", path.display(), e);
        }
    }
    extract(&read?, asset)
}

/// Compute SHA-256 of a file and return the digest as lowercase hex.
/// Reads in chunks to keep memory use bounded; suitable for large files.
pub fn sha256_path(path: &Path) -> Result<String, ChecksumError> {
    let mut f = File::open(path).map_err(io_err(path))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = f.read(&mut buf).map_err(io_err(path))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
