//! Minimal HTTP/1.1 stand-in for the relay service, for integration tests.
//!
//! Serves the three upstream endpoints (`GET /`, `POST /track-info`,
//! `POST /download`) plus the file the download redirects to. Priming sets a
//! clearance cookie that `track-info` can be told to require. Every request is
//! answered with `Connection: close`.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Bytes served as "the media file".
pub fn media_bytes() -> Vec<u8> {
    let mut body = b"ID3\x04\x00\x00\x00\x00\x00\x00".to_vec();
    body.extend((0u8..=250).cycle().take(64 * 1024));
    body
}

#[derive(Debug, Clone, Copy)]
pub enum MetadataEncoding {
    Identity,
    Gzip,
    /// gzip applied first, then br; advertised as `br, gzip`.
    BrotliOverGzip,
    /// Advertises the given coding but sends the body as is.
    Lying(&'static str),
}

#[derive(Debug, Clone)]
pub enum DownloadMode {
    /// 302 to `/files/track.mp3`.
    Redirect,
    /// 200 with the media bytes and an optional Content-Disposition.
    Attachment(Option<&'static str>),
    /// Plain error status.
    Status(u16),
}

#[derive(Debug, Clone)]
pub struct UpstreamOptions {
    pub priming_status: u16,
    pub require_cookie: bool,
    pub metadata: &'static str,
    pub metadata_encoding: MetadataEncoding,
    pub download: DownloadMode,
}

impl Default for UpstreamOptions {
    fn default() -> Self {
        Self {
            priming_status: 200,
            require_cookie: true,
            metadata: r#"{"title":"X","artist":"Y","image":"https://img/x.jpg","duration":"3:35"}"#,
            metadata_encoding: MetadataEncoding::Gzip,
            download: DownloadMode::Redirect,
        }
    }
}

/// A request as the stub saw it.
#[derive(Debug, Clone)]
pub struct Hit {
    pub method: String,
    pub path: String,
    pub body: String,
}

impl Hit {
    pub fn line(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

pub struct Upstream {
    /// e.g. "http://127.0.0.1:12345"
    pub origin: String,
    hits: Arc<Mutex<Vec<Hit>>>,
}

impl Upstream {
    pub fn hits(&self) -> Vec<Hit> {
        self.hits.lock().unwrap().clone()
    }

    /// "METHOD /path" for every request so far.
    pub fn lines(&self) -> Vec<String> {
        self.hits().iter().map(Hit::line).collect()
    }
}

/// Starts the stub in a background thread. It runs until the process exits.
pub fn start(opts: UpstreamOptions) -> Upstream {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let hits = Arc::new(Mutex::new(Vec::new()));
    let hits_srv = Arc::clone(&hits);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let opts = opts.clone();
            let hits = Arc::clone(&hits_srv);
            thread::spawn(move || handle(stream, &opts, &hits));
        }
    });
    Upstream {
        origin: format!("http://127.0.0.1:{}", port),
        hits,
    }
}

struct Request {
    method: String,
    path: String,
    cookie: Option<String>,
    body: Vec<u8>,
}

fn read_request(stream: &mut TcpStream) -> Option<Request> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();

    let mut content_length = 0usize;
    let mut cookie = None;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            } else if name.eq_ignore_ascii_case("cookie") {
                cookie = Some(value.trim().to_string());
            }
        }
    }

    let mut body = buf[header_end..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some(Request {
        method,
        path,
        cookie,
        body,
    })
}

fn respond(stream: &mut TcpStream, status: &str, headers: &[(&str, String)], body: &[u8]) {
    let mut head = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        status,
        body.len()
    );
    for (name, value) in headers {
        head.push_str(&format!("{}: {}\r\n", name, value));
    }
    head.push_str("\r\n");
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
    let _ = stream.flush();
}

fn status_line(code: u16) -> String {
    let reason = match code {
        200 => "OK",
        302 => "Found",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    };
    format!("{} {}", code, reason)
}

fn encode_metadata(text: &str, encoding: MetadataEncoding) -> (Vec<u8>, Option<String>) {
    match encoding {
        MetadataEncoding::Identity => (text.as_bytes().to_vec(), None),
        MetadataEncoding::Gzip => (gzip(text.as_bytes()), Some("gzip".to_string())),
        MetadataEncoding::BrotliOverGzip => {
            (brotli(&gzip(text.as_bytes())), Some("br, gzip".to_string()))
        }
        MetadataEncoding::Lying(coding) => (text.as_bytes().to_vec(), Some(coding.to_string())),
    }
}

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

fn brotli(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut enc = brotli::CompressorWriter::new(&mut out, 4096, 5, 22);
        enc.write_all(data).unwrap();
    }
    out
}

fn handle(mut stream: TcpStream, opts: &UpstreamOptions, hits: &Mutex<Vec<Hit>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));
    let Some(req) = read_request(&mut stream) else {
        return;
    };
    hits.lock().unwrap().push(Hit {
        method: req.method.clone(),
        path: req.path.clone(),
        body: String::from_utf8_lossy(&req.body).into_owned(),
    });

    match (req.method.as_str(), req.path.as_str()) {
        ("GET", "/") => respond(
            &mut stream,
            &status_line(opts.priming_status),
            &[
                ("Content-Type", "text/html".to_string()),
                ("Set-Cookie", "cf_clearance=ok; Path=/".to_string()),
            ],
            b"<html>welcome</html>",
        ),
        ("POST", "/track-info") => {
            let cleared = req
                .cookie
                .as_deref()
                .is_some_and(|c| c.contains("cf_clearance=ok"));
            if opts.require_cookie && !cleared {
                respond(&mut stream, &status_line(403), &[], b"<html>Just a moment...</html>");
                return;
            }
            let (body, encoding) = encode_metadata(opts.metadata, opts.metadata_encoding);
            let mut headers = vec![("Content-Type", "application/json".to_string())];
            if let Some(encoding) = encoding {
                headers.push(("Content-Encoding", encoding));
            }
            respond(&mut stream, &status_line(200), &headers, &body);
        }
        ("POST", "/download") => match &opts.download {
            DownloadMode::Redirect => respond(
                &mut stream,
                &status_line(302),
                &[("Location", "/files/track.mp3".to_string())],
                b"",
            ),
            DownloadMode::Attachment(disposition) => {
                let mut headers = vec![("Content-Type", "audio/mpeg".to_string())];
                if let Some(d) = disposition {
                    headers.push(("Content-Disposition", d.to_string()));
                }
                respond(&mut stream, &status_line(200), &headers, &media_bytes());
            }
            DownloadMode::Status(code) => {
                respond(&mut stream, &status_line(*code), &[], b"<html>error</html>")
            }
        },
        ("GET", "/files/track.mp3") => respond(
            &mut stream,
            &status_line(200),
            &[("Content-Type", "audio/mpeg".to_string())],
            &media_bytes(),
        ),
        _ => respond(&mut stream, &status_line(404), &[], b"not found"),
    }
}
