//! Release command: latest GitHub release asset, verified against its `.sha256`.

use anyhow::Result;
use relget_core::config::RelgetConfig;
use relget_core::downloader::Downloader;
use relget_core::fetch::{self, FetchOptions};
use relget_core::progress::Progress;
use relget_core::release;
use relget_core::transport::Transport;
use std::path::Path;

pub fn run_release<T: Transport>(
    downloader: &mut Downloader<T>,
    cfg: &RelgetConfig,
    repo: &str,
    asset: &str,
    dir: &Path,
) -> Result<()> {
    let (owner, name) = release::parse_repo(repo)?;
    let api_version = cfg.http.github_api_version.as_str();
    let url = release::latest_release_url(owner, name);
    let latest = release::fetch_release(downloader, &url, api_version)?;

    let options = FetchOptions {
        api_version,
        ..FetchOptions::default()
    };
    let path = fetch::fetch_verified(downloader, &latest, asset, dir, &options, |a| {
        if cfg.progress {
            Progress::for_terminal(&a.name, Some(a.size))
        } else {
            Progress::new()
        }
    })?;
    println!("{}", path.display());
    Ok(())
}
