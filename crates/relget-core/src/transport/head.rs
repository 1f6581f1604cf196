//! Response status line and header parsing.

/// Status and the headers the downloader cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: u32,
    /// `Content-Length`, if present: the number of body bytes in this response.
    pub content_length: Option<u64>,
    /// True if the server sent `Accept-Ranges: bytes`. Informational only; the
    /// downloader infers range support from lengths.
    pub accept_ranges: bool,
    /// Full asset length from `Content-Range: bytes <range>/<length>`, when stated.
    pub instance_length: Option<u64>,
}

impl ResponseHead {
    pub fn new(status: u32, content_length: Option<u64>) -> Self {
        Self {
            status,
            content_length,
            accept_ranges: false,
            instance_length: None,
        }
    }

    pub fn with_instance_length(mut self, length: u64) -> Self {
        self.instance_length = Some(length);
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Parse collected header lines into a `ResponseHead`.
///
/// With redirects, curl reports every response's headers; only the block
/// following the last status line is used. Returns `None` when no status line
/// was seen.
pub fn parse_head<S: AsRef<str>>(lines: &[S]) -> Option<ResponseHead> {
    let start = lines
        .iter()
        .rposition(|l| l.as_ref().trim_start().starts_with("HTTP/"))?;
    let status = lines[start]
        .as_ref()
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse::<u32>().ok())?;

    let mut head = ResponseHead::new(status, None);
    for line in &lines[start + 1..] {
        let line = line.as_ref().trim();
        if line.is_empty() {
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-length") {
                head.content_length = value.parse::<u64>().ok();
            }
            if name.eq_ignore_ascii_case("accept-ranges") {
                head.accept_ranges = value.eq_ignore_ascii_case("bytes");
            }
            if name.eq_ignore_ascii_case("content-range") {
                head.instance_length = parse_instance_length(value);
            }
        }
    }
    Some(head)
}

/// `bytes 0-99/1000` and `bytes */1000` both give 1000; `bytes 0-99/*` gives `None`.
fn parse_instance_length(value: &str) -> Option<u64> {
    let rest = value.strip_prefix("bytes")?.trim_start();
    let (_, length) = rest.rsplit_once('/')?;
    length.trim().parse().ok()
}
