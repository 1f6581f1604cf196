//! Minimal HTTP/1.1 server with `Range: bytes=N-` support for integration tests.
//!
//! Serves static bodies by path. Can ignore ranges, cut the body of the first
//! few GETs short, or answer the first few GETs with an error status. Every
//! request's path and `Range` start is recorded.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RangeServerOptions {
    /// If false, GET ignores Range and always returns 200 with the full body.
    pub support_ranges: bool,
    /// If false, omit `Accept-Ranges: bytes` header even if ranges work.
    pub advertise_ranges: bool,
    /// The first `cut_first` GETs send full headers but only half the body, then close.
    pub cut_first: u32,
    /// The first `fail_first` GETs are answered with `fail_status` and no body.
    pub fail_first: u32,
    pub fail_status: u16,
}

impl Default for RangeServerOptions {
    fn default() -> Self {
        Self {
            support_ranges: true,
            advertise_ranges: true,
            cut_first: 0,
            fail_first: 0,
            fail_status: 503,
        }
    }
}

/// One request as seen by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seen {
    pub path: String,
    pub range_start: Option<u64>,
}

pub struct RangeServer {
    base: String,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl RangeServer {
    /// Absolute URL of `path` (leading slash optional).
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    pub fn requests(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    pub fn range_starts(&self) -> Vec<Option<u64>> {
        self.requests().into_iter().map(|s| s.range_start).collect()
    }
}

/// Starts a server in a background thread serving `body` at `/file.bin`.
/// The server runs until the process exits.
pub fn start(body: Vec<u8>) -> RangeServer {
    start_with_options(vec![("/file.bin".to_string(), body)], RangeServerOptions::default())
}

/// Serve each `(path, body)` pair with the given behavior.
pub fn start_with_options(routes: Vec<(String, Vec<u8>)>, opts: RangeServerOptions) -> RangeServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let routes: Arc<HashMap<String, Vec<u8>>> = Arc::new(routes.into_iter().collect());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let gets = Arc::new(AtomicU32::new(0));
    let log = Arc::clone(&seen);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let routes = Arc::clone(&routes);
            let log = Arc::clone(&log);
            let gets = Arc::clone(&gets);
            thread::spawn(move || handle(stream, &routes, opts, &log, &gets));
        }
    });
    RangeServer {
        base: format!("http://127.0.0.1:{}", port),
        seen,
    }
}

fn handle(
    mut stream: TcpStream,
    routes: &HashMap<String, Vec<u8>>,
    opts: RangeServerOptions,
    log: &Mutex<Vec<Seen>>,
    gets: &AtomicU32,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let (method, path, range_start) = parse_request(request);
    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(
            b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        return;
    }
    log.lock().unwrap().push(Seen {
        path: path.to_string(),
        range_start,
    });
    let nth = gets.fetch_add(1, Ordering::SeqCst) + 1;

    if nth <= opts.fail_first {
        let response = format!(
            "HTTP/1.1 {} Failing\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            opts.fail_status
        );
        let _ = stream.write_all(response.as_bytes());
        return;
    }

    let Some(body) = routes.get(path) else {
        let _ = stream.write_all(
            b"HTTP/1.1 404 Not Found\r\nContent-Length: 9\r\nConnection: close\r\n\r\nnot found",
        );
        return;
    };
    let total = body.len() as u64;

    let (status, content_range, slice) = match range_start.filter(|_| opts.support_ranges) {
        Some(start) if start >= total => (
            "416 Range Not Satisfiable",
            format!("bytes */{}", total),
            &body[0..0],
        ),
        Some(start) => (
            "206 Partial Content",
            format!("bytes {}-{}/{}", start, total - 1, total),
            &body[start as usize..],
        ),
        None => (
            "200 OK",
            format!("bytes 0-{}/{}", total.saturating_sub(1), total),
            &body[..],
        ),
    };
    let accept_ranges = if opts.advertise_ranges && opts.support_ranges {
        "Accept-Ranges: bytes\r\n"
    } else {
        ""
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nContent-Range: {}\r\n{}Connection: close\r\n\r\n",
        status,
        slice.len(),
        content_range,
        accept_ranges
    );
    let _ = stream.write_all(response.as_bytes());
    if nth <= opts.cut_first {
        let _ = stream.write_all(&slice[..slice.len() / 2]);
        let _ = stream.flush();
        return;
    }
    let _ = stream.write_all(slice);
}

/// Returns (method, path, start of `Range: bytes=N-`).
fn parse_request(request: &str) -> (&str, &str, Option<u64>) {
    let mut method = "";
    let mut path = "";
    let mut range = None;
    for line in request.lines() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if method.is_empty() {
            let mut parts = line.split_whitespace();
            method = parts.next().unwrap_or("");
            path = parts.next().unwrap_or("");
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("range") {
                let value = value.trim();
                if let Some(ranges) = value.strip_prefix("bytes=") {
                    if let Some((a, _)) = ranges.split_once('-') {
                        range = a.trim().parse::<u64>().ok();
                    }
                }
            }
        }
    }
    (method, path, range)
}
