//! CLI for the relget release asset downloader.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use relget_core::config::{self, RelgetConfig};
use relget_core::downloader::Downloader;
use relget_core::retry::RetryPolicy;
use relget_core::transport::CurlTransport;
use std::path::PathBuf;

use commands::{run_checksum, run_digest, run_download, run_release};

/// Top-level CLI for relget.
#[derive(Debug, Parser)]
#[command(name = "relget")]
#[command(about = "relget: resumable, checksum-verified release asset downloader", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download a URL, resuming into an existing partial file.
    Download {
        /// Direct HTTP/HTTPS URL to download.
        url: String,

        /// Output path (default: last URL path segment). `-` streams to stdout without retries.
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Expected size in bytes; every response must agree with it.
        #[arg(long, value_name = "BYTES")]
        size: Option<u64>,

        /// Extra request header, `Name: value`. Repeatable.
        #[arg(short = 'H', long = "header", value_name = "HEADER")]
        headers: Vec<String>,
    },

    /// Download an asset of a GitHub repository's latest release and verify its SHA-256.
    Release {
        /// Repository as `owner/repo`.
        repo: String,

        /// Asset name, e.g. `minijinja-cli-x86_64-unknown-linux-musl.tar.xz`.
        asset: String,

        /// Directory to store the asset in (default: current directory).
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// Compute SHA-256 of a file (e.g. after download).
    Checksum {
        /// Path to the file.
        path: PathBuf,
    },

    /// Print the digest a `.sha256` file publishes for an asset. The file is deleted.
    Digest {
        /// Path to the checksum file.
        file: PathBuf,

        /// Asset name the file must name.
        asset: String,
    },
}

fn downloader(cfg: &RelgetConfig, policy: RetryPolicy) -> Downloader<CurlTransport> {
    Downloader::new(CurlTransport::new(&cfg.http), policy)
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let policy = RetryPolicy::from(&cfg.retry);

        match cli.command {
            CliCommand::Download {
                url,
                output,
                size,
                headers,
            } => {
                let to_stdout = output.as_deref().is_some_and(|p| p.as_os_str() == "-");
                let policy = if to_stdout {
                    RetryPolicy::single_attempt()
                } else {
                    policy
                };
                run_download(
                    &mut downloader(&cfg, policy),
                    &cfg,
                    &url,
                    output.as_deref(),
                    size,
                    &headers,
                )?;
            }
            CliCommand::Release { repo, asset, dir } => {
                let dir = match dir {
                    Some(dir) => dir,
                    None => std::env::current_dir()?,
                };
                run_release(&mut downloader(&cfg, policy), &cfg, &repo, &asset, &dir)?;
            }
            CliCommand::Checksum { path } => run_checksum(&path)?,
            CliCommand::Digest { file, asset } => run_digest(&file, &asset)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
