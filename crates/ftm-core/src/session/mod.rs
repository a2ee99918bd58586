//! Browser-like upstream session.
//!
//! One session per inbound request. The libcurl easy handle keeps its cookie
//! engine and connection cache across calls, so cookies handed out by the
//! priming request ride along on the metadata and media calls. Sessions are
//! never pooled or shared between requests.
//!
//! Everything here blocks the calling thread; call from `spawn_blocking` when
//! used from async code.

mod error;
mod headers;

pub use error::TransportError;
pub use headers::ResponseHeaders;

use headers::HeaderCollector;
use std::cell::Cell;
use std::io::{self, Write};
use std::time::Duration;

use crate::config::FtmConfig;
use crate::decode;

/// Status and headers of the final response of a transfer.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub status: u32,
    pub headers: ResponseHeaders,
    /// URL of the last hop after redirects were followed.
    pub effective_url: Option<String>,
}

impl ResponseHead {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A fully buffered response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub head: ResponseHead,
    /// Body exactly as received; content codings are not undone.
    pub body: Vec<u8>,
}

impl UpstreamResponse {
    /// Body as text, content codings undone through the relay.
    pub fn text(&self) -> String {
        decode::decode_body(&self.body, self.head.headers.content_encoding.as_deref())
    }
}

/// The upstream calls the resolution pipeline needs, in the order it makes them.
///
/// Paths are relative to the configured origin. Every method except
/// [`UpstreamSession::prime`] treats a non-2xx final status as
/// [`TransportError::Http`].
pub trait UpstreamSession {
    /// GETs the origin root so the anti-automation layer can hand out its
    /// cookies. The status is returned, not judged.
    fn prime(&mut self) -> Result<u32, TransportError>;

    /// POSTs `payload` as JSON and buffers the response.
    fn post_json(
        &mut self,
        path: &str,
        payload: &serde_json::Value,
    ) -> Result<UpstreamResponse, TransportError>;

    /// POSTs `payload` as JSON, follows redirects and returns the final URL.
    /// The transfer stops as soon as the final body starts arriving.
    fn post_json_follow(
        &mut self,
        path: &str,
        payload: &serde_json::Value,
    ) -> Result<String, TransportError>;

    /// POSTs `payload` as JSON, follows redirects and streams the final body into `sink`.
    fn post_json_into(
        &mut self,
        path: &str,
        payload: &serde_json::Value,
        sink: &mut dyn Write,
    ) -> Result<ResponseHead, TransportError>;

    /// GETs an absolute URL and streams the body into `sink`.
    fn get_into(&mut self, url: &str, sink: &mut dyn Write) -> Result<ResponseHead, TransportError>;
}

/// [`UpstreamSession`] backed by a single libcurl easy handle.
pub struct CurlSession {
    easy: curl::easy::Easy,
    base: url::Url,
    origin: String,
    timeout: Duration,
    download_timeout: Duration,
}

impl CurlSession {
    pub fn new(cfg: &FtmConfig) -> Result<Self, TransportError> {
        let origin = cfg.origin_trimmed().to_string();
        let base = url::Url::parse(&format!("{}/", origin))?;

        let mut easy = curl::easy::Easy::new();
        // An empty cookie file turns on the in-memory cookie engine.
        easy.cookie_file("")?;
        easy.useragent(&cfg.user_agent)?;
        easy.follow_location(true)?;
        easy.max_redirections(cfg.max_redirections)?;
        easy.connect_timeout(cfg.connect_timeout())?;

        Ok(Self {
            easy,
            base,
            origin,
            timeout: cfg.timeout(),
            download_timeout: cfg.download_timeout(),
        })
    }

    /// Header set of a desktop browser talking to the origin's own frontend.
    fn browser_headers(&self, json_body: bool) -> Result<curl::easy::List, curl::Error> {
        let mut list = curl::easy::List::new();
        list.append("Accept: */*")?;
        if json_body {
            list.append("Content-Type: application/json")?;
        }
        list.append(&format!("Origin: {}", self.origin))?;
        list.append(&format!("Referer: {}/", self.origin))?;
        // Sent by hand so curl leaves the body encoded for the relay.
        list.append("Accept-Encoding: gzip, deflate, br, zstd")?;
        Ok(list)
    }

    fn prepare_get(&mut self, url: &str, timeout: Duration) -> Result<(), TransportError> {
        let headers = self.browser_headers(false)?;
        self.easy.url(url)?;
        self.easy.get(true)?;
        self.easy.http_headers(headers)?;
        self.easy.timeout(timeout)?;
        Ok(())
    }

    fn prepare_post(
        &mut self,
        path: &str,
        payload: &serde_json::Value,
        timeout: Duration,
    ) -> Result<(), TransportError> {
        let url = self.base.join(path.trim_start_matches('/'))?;
        let body = serde_json::to_vec(payload).map_err(io::Error::from)?;
        let headers = self.browser_headers(true)?;
        self.easy.url(url.as_str())?;
        self.easy.post(true)?;
        self.easy.post_fields_copy(&body)?;
        self.easy.http_headers(headers)?;
        self.easy.timeout(timeout)?;
        Ok(())
    }

    /// Runs the prepared transfer. With `stop_at_body` the transfer is cut at
    /// the first body byte of the final response.
    fn perform(
        &mut self,
        sink: &mut dyn Write,
        stop_at_body: bool,
    ) -> Result<ResponseHead, TransportError> {
        let mut collector = HeaderCollector::default();
        let mut write_error: Option<io::Error> = None;
        let stopped = Cell::new(false);

        let result = {
            let mut transfer = self.easy.transfer();
            transfer.header_function(|data| {
                collector.push(data);
                true
            })?;
            transfer.write_function(|data| {
                if stop_at_body {
                    stopped.set(true);
                    return Ok(0); // abort transfer
                }
                match sink.write_all(data) {
                    Ok(()) => Ok(data.len()),
                    Err(e) => {
                        write_error = Some(e);
                        Ok(0) // abort transfer
                    }
                }
            })?;
            transfer.perform()
        };

        if let Some(e) = write_error {
            return Err(TransportError::Io(e));
        }
        match result {
            Ok(()) => {}
            Err(e) if stopped.get() && e.is_write_error() => {}
            Err(e) => return Err(e.into()),
        }

        let status = self.easy.response_code()?;
        let effective_url = self.easy.effective_url()?.map(str::to_string);
        Ok(ResponseHead {
            status,
            headers: collector.finish(),
            effective_url,
        })
    }
}

fn require_success(head: &ResponseHead) -> Result<(), TransportError> {
    if head.is_success() {
        Ok(())
    } else {
        Err(TransportError::Http(head.status))
    }
}

impl UpstreamSession for CurlSession {
    fn prime(&mut self) -> Result<u32, TransportError> {
        let url = self.base.to_string();
        self.prepare_get(&url, self.timeout)?;
        let head = self.perform(&mut io::sink(), false)?;
        tracing::debug!(status = head.status, "primed upstream session at {}", url);
        Ok(head.status)
    }

    fn post_json(
        &mut self,
        path: &str,
        payload: &serde_json::Value,
    ) -> Result<UpstreamResponse, TransportError> {
        self.prepare_post(path, payload, self.timeout)?;
        let mut body = Vec::new();
        let head = self.perform(&mut body, false)?;
        require_success(&head)?;
        Ok(UpstreamResponse { head, body })
    }

    fn post_json_follow(
        &mut self,
        path: &str,
        payload: &serde_json::Value,
    ) -> Result<String, TransportError> {
        self.prepare_post(path, payload, self.timeout)?;
        let head = self.perform(&mut io::sink(), true)?;
        require_success(&head)?;
        match head.effective_url {
            Some(url) => Ok(url),
            None => Ok(self.base.join(path.trim_start_matches('/'))?.to_string()),
        }
    }

    fn post_json_into(
        &mut self,
        path: &str,
        payload: &serde_json::Value,
        sink: &mut dyn Write,
    ) -> Result<ResponseHead, TransportError> {
        self.prepare_post(path, payload, self.download_timeout)?;
        let head = self.perform(sink, false)?;
        require_success(&head)?;
        Ok(head)
    }

    fn get_into(&mut self, url: &str, sink: &mut dyn Write) -> Result<ResponseHead, TransportError> {
        self.prepare_get(url, self.download_timeout)?;
        let head = self.perform(sink, false)?;
        require_success(&head)?;
        Ok(head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_accepts_default_config() {
        assert!(CurlSession::new(&FtmConfig::default()).is_ok());
    }

    #[test]
    fn new_session_rejects_bad_origin() {
        let err = CurlSession::new(&FtmConfig::with_origin("::nope")).err().unwrap();
        assert!(matches!(err, TransportError::Url(_)));
    }

    #[test]
    fn response_text_goes_through_relay() {
        use std::io::Write as _;
        let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(b"{\"ok\":true}").unwrap();
        let resp = UpstreamResponse {
            head: ResponseHead {
                status: 200,
                headers: ResponseHeaders {
                    content_encoding: Some("gzip".to_string()),
                    ..ResponseHeaders::default()
                },
                effective_url: None,
            },
            body: enc.finish().unwrap(),
        };
        assert_eq!(resp.text(), "{\"ok\":true}");
    }

    #[test]
    fn success_range() {
        let mut head = ResponseHead {
            status: 204,
            headers: ResponseHeaders::default(),
            effective_url: None,
        };
        assert!(head.is_success());
        head.status = 302;
        assert!(!head.is_success());
        assert!(matches!(require_success(&head), Err(TransportError::Http(302))));
    }
}
