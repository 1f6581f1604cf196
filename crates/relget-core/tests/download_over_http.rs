//! Integration tests: `CurlTransport` against a local range-capable HTTP server.

mod common;

use common::range_server::{self, RangeServerOptions};
use relget_core::downloader::{DownloadError, DownloadRequest, Downloader};
use relget_core::fetch::{self, FetchOptions};
use relget_core::progress::{Counter, Progress};
use relget_core::release::{self, Release};
use relget_core::retry::RetryPolicy;
use relget_core::transport::CurlTransport;
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::Cursor;
use std::time::Duration;
use tempfile::tempdir;

fn body(len: usize) -> Vec<u8> {
    (0u8..251).cycle().take(len).collect()
}

fn downloader(max_attempts: u32) -> Downloader<CurlTransport> {
    let policy = RetryPolicy {
        max_attempts,
        base_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
    };
    Downloader::new(CurlTransport::default(), policy)
}

fn open(path: &std::path::Path) -> fs::File {
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .unwrap()
}

#[test]
fn fresh_download_matches_served_body() {
    let data = body(64 * 1024);
    let server = range_server::start(data.clone());
    let dir = tempdir().unwrap();
    let path = dir.path().join("file.bin");

    let counter = Counter::new();
    let stats = counter.handle();
    let mut progress = Progress::new().with_sink(counter);
    let request = DownloadRequest::new(&server.url("file.bin")).unwrap();
    let report = downloader(3)
        .download(&request, &mut open(&path), &mut progress)
        .unwrap();

    assert_eq!(report.size, data.len() as u64);
    assert_eq!(report.attempts, 1);
    assert_eq!(fs::read(&path).unwrap(), data);
    assert_eq!(server.range_starts(), vec![None]);
    let snap = stats.snapshot();
    assert_eq!(snap.bytes_done, data.len() as u64);
    assert_eq!(snap.total_bytes, Some(data.len() as u64));
    assert_eq!(snap.close_calls, 1);
}

#[test]
fn resume_requests_missing_suffix_only() {
    let data = body(10_000);
    let server = range_server::start(data.clone());
    let dir = tempdir().unwrap();
    let path = dir.path().join("file.bin");
    fs::write(&path, &data[..3_000]).unwrap();

    let request = DownloadRequest::new(&server.url("file.bin"))
        .unwrap()
        .with_size(data.len() as u64);
    let report = downloader(3)
        .download(&request, &mut open(&path), &mut Progress::new())
        .unwrap();

    assert_eq!(report.transferred, 7_000);
    assert_eq!(server.range_starts(), vec![Some(3_000)]);
    assert_eq!(fs::read(&path).unwrap(), data);
}

#[test]
fn server_ignoring_range_restarts_without_duplication() {
    let data = body(20_000);
    let opts = RangeServerOptions {
        support_ranges: false,
        advertise_ranges: false,
        ..Default::default()
    };
    let server = range_server::start_with_options(vec![("/a.bin".into(), data.clone())], opts);
    let dir = tempdir().unwrap();
    let path = dir.path().join("a.bin");
    fs::write(&path, &data[..5_000]).unwrap();

    let request = DownloadRequest::new(&server.url("a.bin"))
        .unwrap()
        .with_size(data.len() as u64);
    let report = downloader(1)
        .download(&request, &mut open(&path), &mut Progress::new())
        .unwrap();

    assert_eq!(report.restarts, 1);
    assert_eq!(server.range_starts(), vec![Some(5_000), None]);
    assert_eq!(fs::read(&path).unwrap(), data);
}

#[test]
fn interrupted_bodies_are_resumed() {
    let data = body(40_000);
    let opts = RangeServerOptions {
        cut_first: 2,
        ..Default::default()
    };
    let server = range_server::start_with_options(vec![("/f".into(), data.clone())], opts);
    let dir = tempdir().unwrap();
    let path = dir.path().join("f");

    let request = DownloadRequest::new(&server.url("f")).unwrap();
    let report = downloader(5)
        .download(&request, &mut open(&path), &mut Progress::new())
        .unwrap();

    assert_eq!(report.attempts, 3);
    assert_eq!(server.range_starts(), vec![None, Some(20_000), Some(30_000)]);
    assert_eq!(fs::read(&path).unwrap(), data);
}

#[test]
fn throttled_responses_are_retried() {
    let data = body(1_000);
    let opts = RangeServerOptions {
        fail_first: 2,
        fail_status: 503,
        ..Default::default()
    };
    let server = range_server::start_with_options(vec![("/f".into(), data.clone())], opts);
    let mut dest = Cursor::new(Vec::new());

    let request = DownloadRequest::new(&server.url("f")).unwrap();
    let report = downloader(5)
        .download(&request, &mut dest, &mut Progress::new())
        .unwrap();

    assert_eq!(report.attempts, 3);
    assert_eq!(dest.into_inner(), data);
}

#[test]
fn retries_stop_at_the_attempt_cap() {
    let opts = RangeServerOptions {
        fail_first: u32::MAX,
        fail_status: 502,
        ..Default::default()
    };
    let server = range_server::start_with_options(vec![("/f".into(), body(10))], opts);

    let request = DownloadRequest::new(&server.url("f")).unwrap();
    let err = downloader(4)
        .download(&request, &mut Cursor::new(Vec::new()), &mut Progress::new())
        .unwrap_err();

    match &err {
        DownloadError::RetriesExhausted { attempts, last } => {
            assert_eq!(*attempts, 4);
            assert_eq!(last.depth(), 4);
        }
        other => panic!("expected RetriesExhausted, got {:?}", other),
    }
    assert_eq!(err.http_status(), Some(502));
    assert_eq!(server.requests().len(), 4);
}

#[test]
fn not_found_fails_without_retry() {
    let server = range_server::start(body(10));
    let request = DownloadRequest::new(&server.url("missing")).unwrap();
    let err = downloader(5)
        .download(&request, &mut Cursor::new(Vec::new()), &mut Progress::new())
        .unwrap_err();

    assert!(matches!(err, DownloadError::Transfer(_)));
    assert_eq!(err.http_status(), Some(404));
    assert_eq!(server.requests().len(), 1);
}

#[test]
fn complete_destination_transfers_nothing() {
    let data = body(4_096);
    let server = range_server::start(data.clone());
    let dir = tempdir().unwrap();
    let path = dir.path().join("file.bin");
    fs::write(&path, &data).unwrap();

    let request = DownloadRequest::new(&server.url("file.bin"))
        .unwrap()
        .with_size(data.len() as u64);
    let report = downloader(3)
        .download(&request, &mut open(&path), &mut Progress::new())
        .unwrap();

    assert_eq!(report.transferred, 0);
    assert_eq!(report.attempts, 1);
    assert_eq!(fs::read(&path).unwrap(), data);
}

#[test]
fn complete_destination_without_declared_size_transfers_nothing() {
    let data = body(4_096);
    let server = range_server::start(data.clone());
    let dir = tempdir().unwrap();
    let path = dir.path().join("file.bin");
    fs::write(&path, &data).unwrap();

    let request = DownloadRequest::new(&server.url("file.bin")).unwrap();
    let report = downloader(3)
        .download(&request, &mut open(&path), &mut Progress::new())
        .unwrap();

    assert_eq!(report.size, data.len() as u64);
    assert_eq!(report.transferred, 0);
    assert_eq!(server.range_starts(), vec![Some(4_096)]);
    assert_eq!(fs::read(&path).unwrap(), data);
}

#[test]
fn declared_size_mismatch_is_an_integrity_error() {
    let server = range_server::start(body(100));
    let request = DownloadRequest::new(&server.url("file.bin"))
        .unwrap()
        .with_size(150);
    let err = downloader(5)
        .download(&request, &mut Cursor::new(Vec::new()), &mut Progress::new())
        .unwrap_err();

    assert!(matches!(
        err,
        DownloadError::Integrity {
            expected: 150,
            reported: 100,
            position: 0
        }
    ));
    assert_eq!(server.requests().len(), 1);
}

#[test]
fn release_asset_is_fetched_and_verified() {
    let payload = body(30_000);
    let name = "tool-x86_64-linux.tar.xz";
    let sums = format!("{} *{}\n", hex::encode(Sha256::digest(&payload)), name);

    let routes = vec![
        ("/assets/1".to_string(), payload.clone()),
        ("/assets/2".to_string(), sums.clone().into_bytes()),
    ];
    let server = range_server::start_with_options(routes, RangeServerOptions::default());
    let json = serde_json::json!({
        "tag_name": "v1.0.0",
        "assets": [
            {"name": name, "size": payload.len(), "url": server.url("assets/1")},
            {"name": format!("{}.sha256", name), "size": sums.len(), "url": server.url("assets/2")},
        ]
    });
    let release = Release::from_json(json.to_string().as_bytes()).unwrap();

    let dir = tempdir().unwrap();
    fs::write(fetch::part_path(dir.path(), name), &payload[..12_345]).unwrap();

    let mut dl = downloader(3);
    let path = fetch::fetch_verified(
        &mut dl,
        &release,
        name,
        dir.path(),
        &FetchOptions::default(),
        |_| Progress::new(),
    )
    .unwrap();

    assert_eq!(path, dir.path().join(name));
    assert_eq!(fs::read(&path).unwrap(), payload);
    assert!(!dir.path().join(release::checksum_name(name)).exists());
    assert!(!fetch::part_path(dir.path(), name).exists());
    let seen: Vec<(String, Option<u64>)> = server
        .requests()
        .into_iter()
        .map(|s| (s.path, s.range_start))
        .collect();
    assert_eq!(
        seen,
        vec![
            ("/assets/2".to_string(), None),
            ("/assets/1".to_string(), Some(12_345)),
        ]
    );
}

#[test]
fn release_metadata_is_loaded_over_http() {
    let json = br#"{"tag_name":"v2","assets":[{"name":"a","size":1,"url":"https://example.invalid/a"}]}"#;
    let server = range_server::start_with_options(
        vec![("/releases/latest".into(), json.to_vec())],
        RangeServerOptions::default(),
    );
    let mut dl = downloader(2);
    let release = release::fetch_release(&mut dl, &server.url("releases/latest"), "2022-11-28")
        .unwrap();
    assert_eq!(release.tag_name, "v2");
    assert_eq!(release.find("a").unwrap().size, 1);
}
