//! Response header collection and parsing.

/// Headers of the final response of a transfer (after any redirects).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaders {
    pub content_encoding: Option<String>,
    pub content_disposition: Option<String>,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
}

/// Accumulates raw header lines from curl's header callback.
///
/// curl reports the headers of every response in a redirect chain; a new
/// status line starts a new block, so only the last block survives.
#[derive(Debug, Default)]
pub(crate) struct HeaderCollector {
    lines: Vec<String>,
}

impl HeaderCollector {
    pub(crate) fn push(&mut self, data: &[u8]) {
        let line = String::from_utf8_lossy(data);
        let line = line.trim_end();
        if line.starts_with("HTTP/") {
            self.lines.clear();
        }
        if !line.is_empty() {
            self.lines.push(line.to_string());
        }
    }

    pub(crate) fn finish(self) -> ResponseHeaders {
        parse_headers(&self.lines)
    }
}

/// Parse collected header lines into ResponseHeaders.
pub(crate) fn parse_headers(lines: &[String]) -> ResponseHeaders {
    let mut headers = ResponseHeaders::default();

    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        let value = value.trim();
        if name.eq_ignore_ascii_case("content-encoding") {
            // Repeated headers are one comma-separated list, in order.
            headers.content_encoding = Some(match headers.content_encoding.take() {
                Some(prev) => format!("{}, {}", prev, value),
                None => value.to_string(),
            });
        } else if name.eq_ignore_ascii_case("content-disposition") {
            headers.content_disposition = Some(value.to_string());
        } else if name.eq_ignore_ascii_case("content-type") {
            headers.content_type = Some(value.to_string());
        } else if name.eq_ignore_ascii_case("content-length") {
            headers.content_length = value.parse::<u64>().ok();
        }
    }

    headers
}
