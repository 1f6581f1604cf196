//! Download command: fetch one URL into a file (resumable) or stdout.

use anyhow::{bail, Context, Result};
use relget_core::config::RelgetConfig;
use relget_core::downloader::{DownloadRequest, Downloader, Unseekable};
use relget_core::progress::Progress;
use relget_core::transport::Transport;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};

/// Split `Name: value`.
pub fn parse_header(raw: &str) -> Result<(String, String)> {
    match raw.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => bail!("invalid header {:?}; expected 'Name: value'", raw),
    }
}

pub fn run_download<T: Transport>(
    downloader: &mut Downloader<T>,
    cfg: &RelgetConfig,
    url: &str,
    output: Option<&Path>,
    size: Option<u64>,
    headers: &[String],
) -> Result<()> {
    let mut request = DownloadRequest::new(url)?;
    if let Some(size) = size {
        request = request.with_size(size);
    }
    for raw in headers {
        let (name, value) = parse_header(raw)?;
        request = request.header(&name, &value);
    }

    if output.is_some_and(|p| p.as_os_str() == "-") {
        let mut dest = Unseekable(io::stdout().lock());
        downloader.download(&request, &mut dest, &mut Progress::new())?;
        return Ok(());
    }

    let path: PathBuf = match output {
        Some(path) => path.to_path_buf(),
        None => request
            .file_name()
            .map(PathBuf::from)
            .with_context(|| format!("cannot derive a file name from {}; use --output", url))?,
    };
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&path)
        .with_context(|| format!("opening {}", path.display()))?;

    let label = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut progress = if cfg.progress {
        Progress::for_terminal(&label, size)
    } else {
        Progress::new()
    };
    let report = downloader.download(&request, &mut file, &mut progress)?;
    eprintln!(
        "{}: {} bytes ({} transferred, {} attempt(s))",
        path.display(),
        report.size,
        report.transferred,
        report.attempts
    );
    Ok(())
}
