//! GitHub release metadata: the ordered `(name, size, url)` asset list.

use crate::downloader::{DownloadRequest, Downloader};
use crate::progress::Progress;
use crate::transport::Transport;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::io::Cursor;

const API_BASE: &str = "https://api.github.com";

/// One downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    /// Size in bytes as published; every response for this asset must agree.
    pub size: u64,
    /// API URL of the asset. Fetch it with `Accept: application/octet-stream`.
    pub url: String,
}

impl ReleaseAsset {
    /// Request for the asset's bytes, size-checked against the metadata.
    pub fn request(&self, api_version: &str) -> Result<DownloadRequest> {
        let request = DownloadRequest::new(&self.url)
            .with_context(|| format!("asset {} has an invalid URL", self.name))?
            .with_size(self.size)
            .header("Accept", "application/octet-stream")
            .header("X-GitHub-Api-Version", api_version);
        Ok(request)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    #[serde(default)]
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

impl Release {
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).context("invalid release JSON")
    }

    pub fn find(&self, name: &str) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|a| a.name == name)
    }

    /// The `<name>.sha256` asset published next to `name`.
    pub fn checksum_for(&self, name: &str) -> Option<&ReleaseAsset> {
        self.find(&checksum_name(name))
    }

    /// Assets in descending name order, so `x.sha256` comes before `x`.
    pub fn sorted_assets(&self) -> Vec<&ReleaseAsset> {
        let mut assets: Vec<&ReleaseAsset> = self.assets.iter().collect();
        assets.sort_by(|a, b| b.cmp(a));
        assets
    }
}

pub fn checksum_name(asset: &str) -> String {
    format!("{}.sha256", asset)
}

/// `https://api.github.com/repos/<owner>/<repo>/releases/latest`
pub fn latest_release_url(owner: &str, repo: &str) -> String {
    format!("{}/repos/{}/{}/releases/latest", API_BASE, owner, repo)
}

/// Split `owner/repo`.
pub fn parse_repo(repo: &str) -> Result<(&str, &str)> {
    match repo.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok((owner, name))
        }
        _ => anyhow::bail!("expected <owner>/<repo>, got {:?}", repo),
    }
}

/// Download and parse release metadata from `url`.
pub fn fetch_release<T: Transport>(
    downloader: &mut Downloader<T>,
    url: &str,
    api_version: &str,
) -> Result<Release> {
    let request = DownloadRequest::new(url)?
        .header("Accept", "application/vnd.github+json")
        .header("X-GitHub-Api-Version", api_version);
    let mut body = Cursor::new(Vec::new());
    downloader
        .download(&request, &mut body, &mut Progress::new())
        .with_context(|| format!("fetching release metadata from {}", url))?;
    let release = Release::from_json(body.get_ref())?;
    tracing::info!(
        tag = %release.tag_name,
        assets = release.assets.len(),
        "release metadata loaded"
    );
    Ok(release)
}
