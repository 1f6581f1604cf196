//! Download a release asset and verify it against its published `.sha256`.

use crate::checksum::{self, ChecksumError, ExpectedDigest};
use crate::downloader::Downloader;
use crate::progress::Progress;
use crate::release::{Release, ReleaseAsset};
use crate::transport::Transport;
use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

/// Asset and API settings for [`fetch_verified`].
pub struct FetchOptions<'a> {
    /// Value of `X-GitHub-Api-Version`.
    pub api_version: &'a str,
    /// Whether an existing `<dir>/<asset>` whose digest matches is reused.
    pub reuse_existing: bool,
}

impl Default for FetchOptions<'_> {
    fn default() -> Self {
        Self {
            api_version: "2022-11-28",
            reuse_existing: true,
        }
    }
}

/// Path of the in-progress download for `asset` in `dir`.
pub fn part_path(dir: &Path, asset: &str) -> PathBuf {
    dir.join(format!("{}.part", asset))
}

/// Open without truncating so an earlier partial download is resumed.
fn open_resumable(path: &Path) -> Result<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .with_context(|| format!("opening {}", path.display()))
}

fn download_to<T: Transport>(
    downloader: &mut Downloader<T>,
    asset: &ReleaseAsset,
    mut file: File,
    path: &Path,
    api_version: &str,
    progress: &mut Progress,
) -> Result<()> {
    let request = asset.request(api_version)?;
    let report = downloader
        .download(&request, &mut file, progress)
        .with_context(|| format!("downloading {}", asset.name))?;
    tracing::debug!(
        asset = %asset.name,
        transferred = report.transferred,
        attempts = report.attempts,
        restarts = report.restarts,
        "asset stored at {}",
        path.display()
    );
    Ok(())
}

/// Fetch the published digest for `asset`. The checksum file does not outlive this call.
pub fn fetch_digest<T: Transport>(
    downloader: &mut Downloader<T>,
    checksum_asset: &ReleaseAsset,
    asset: &str,
    dir: &Path,
    api_version: &str,
) -> Result<ExpectedDigest> {
    let path = dir.join(&checksum_asset.name);
    // Consumed once: never resume a stale copy of the same size.
    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    let downloaded = download_to(
        downloader,
        checksum_asset,
        file,
        &path,
        api_version,
        &mut Progress::new(),
    );
    if let Err(e) = downloaded {
        let _ = fs::remove_file(&path);
        return Err(e);
    }
    Ok(checksum::extract_file(&path, asset)?)
}

/// Download `asset_name` from `release` into `dir` and verify its SHA-256.
///
/// The payload is written to `<dir>/<asset>.part` and renamed to
/// `<dir>/<asset>` once its digest matches. A digest mismatch removes the
/// partial file; any other failure leaves it in place for the next run.
pub fn fetch_verified<T, F>(
    downloader: &mut Downloader<T>,
    release: &Release,
    asset_name: &str,
    dir: &Path,
    options: &FetchOptions<'_>,
    mut progress_for: F,
) -> Result<PathBuf>
where
    T: Transport,
    F: FnMut(&ReleaseAsset) -> Progress,
{
    let asset = release
        .find(asset_name)
        .with_context(|| format!("release {} has no asset {}", release.tag_name, asset_name))?;
    let checksum_asset = release.checksum_for(asset_name).with_context(|| {
        format!(
            "release {} publishes no checksum for {}",
            release.tag_name, asset_name
        )
    })?;

    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let digest = fetch_digest(downloader, checksum_asset, asset_name, dir, options.api_version)?;

    let target = dir.join(&asset.name);
    if options.reuse_existing && target.is_file() {
        match digest.verify_file(&target) {
            Ok(()) => {
                tracing::info!("{} is already present and verified", target.display());
                return Ok(target);
            }
            Err(e) => tracing::info!("replacing {}: {}", target.display(), e),
        }
    }

    let part = part_path(dir, &asset.name);
    let mut progress = progress_for(asset);
    let file = open_resumable(&part)?;
    download_to(downloader, asset, file, &part, options.api_version, &mut progress)?;

    match digest.verify_file(&part) {
        Ok(()) => {}
        Err(e @ ChecksumError::Mismatch { .. }) => {
            if let Err(rm) = fs::remove_file(&part) {
                tracing::warn!("could not remove {}: {}", part.display(), rm);
            }
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    }

    fs::rename(&part, &target)
        .with_context(|| format!("renaming {} to {}", part.display(), target.display()))?;
    tracing::info!(sha256 = %digest.hex(), "verified {}", target.display());
    Ok(target)
}
