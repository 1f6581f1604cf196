//! `Transport` backed by a libcurl easy handle (blocking, one handle per GET).

use super::head::{parse_head, ResponseHead};
use super::{BodySink, Delivery, Transport};
use crate::config::HttpConfig;
use crate::retry::TransferError;
use std::cell::RefCell;
use std::str;
use std::time::Duration;

/// Blocking HTTP(S) transport. Follows redirects; timeouts come from `[http]` config.
#[derive(Debug, Clone)]
pub struct CurlTransport {
    http: HttpConfig,
}

impl CurlTransport {
    pub fn new(http: &HttpConfig) -> Self {
        Self { http: http.clone() }
    }

    fn configure(&self, easy: &mut curl::easy::Easy, url: &str) -> Result<(), curl::Error> {
        easy.url(url)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.useragent(&self.http.user_agent)?;
        easy.connect_timeout(Duration::from_secs(self.http.connect_timeout_secs))?;
        // Abort when throughput stays below the limit; large assets on slow links
        // are not killed by the hard timeout alone.
        easy.low_speed_limit(self.http.low_speed_limit)?;
        easy.low_speed_time(Duration::from_secs(self.http.low_speed_time_secs))?;
        easy.timeout(Duration::from_secs(self.http.timeout_secs))?;
        Ok(())
    }
}

impl Default for CurlTransport {
    fn default() -> Self {
        Self::new(&HttpConfig::default())
    }
}

impl Transport for CurlTransport {
    fn get(
        &mut self,
        url: &str,
        headers: &[(String, String)],
        body: &mut dyn BodySink,
    ) -> Result<Delivery, TransferError> {
        let mut easy = curl::easy::Easy::new();
        self.configure(&mut easy, url)?;

        let mut list = curl::easy::List::new();
        for (k, v) in headers {
            list.append(&format!("{}: {}", k.trim(), v.trim()))?;
        }
        if !headers.is_empty() {
            easy.http_headers(list)?;
        }

        let lines: RefCell<Vec<String>> = RefCell::new(Vec::new());
        let mut head_sent = false;
        let mut stopped = false;

        let performed = {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    lines.borrow_mut().push(s.trim_end().to_string());
                }
                true
            })?;
            transfer.write_function(|data| {
                if !head_sent {
                    head_sent = true;
                    let head = parse_head(lines.borrow().as_slice())
                        .unwrap_or(ResponseHead::new(0, None));
                    if body.head(&head).is_break() {
                        stopped = true;
                        return Ok(0);
                    }
                }
                if body.chunk(data).is_break() {
                    stopped = true;
                    return Ok(0); // abort transfer
                }
                Ok(data.len())
            })?;
            transfer.perform()
        };

        match performed {
            Err(e) if stopped && e.is_write_error() => return Ok(Delivery::Stopped),
            Err(e) => return Err(TransferError::Curl(e)),
            Ok(()) => {}
        }

        // Empty body: headers were never handed over by the write callback.
        if !head_sent {
            let head = match parse_head(lines.borrow().as_slice()) {
                Some(head) => head,
                None => ResponseHead::new(easy.response_code()?, None),
            };
            if body.head(&head).is_break() {
                return Ok(Delivery::Stopped);
            }
        }
        Ok(Delivery::Complete)
    }
}
