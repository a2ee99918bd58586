//! Content-Encoding relay.
//!
//! Upstream responses arrive raw (curl's own decoding is never enabled) and are
//! unwrapped here. The header is not trusted: codings are applied strictly in
//! the order they are listed, and the first failure abandons the whole chain in
//! favour of the raw body read as text. Nothing in this module returns an error
//! to the pipeline.

mod coding;

pub use coding::{parse_content_encoding, ContentCoding};

use std::fmt;
use std::io;

/// A coding in the chain failed to decode its input.
#[derive(Debug)]
pub struct DecodeError {
    /// Zero-based position of the failing coding in the header.
    pub position: usize,
    pub coding: ContentCoding,
    pub source: io::Error,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "content coding #{} ({}) failed: {}",
            self.position, self.coding, self.source
        )
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Applies every coding named in `header_value`, left to right.
pub fn decode_chain(raw: &[u8], header_value: &str) -> Result<Vec<u8>, DecodeError> {
    let mut data = raw.to_vec();
    for (position, coding) in parse_content_encoding(header_value).into_iter().enumerate() {
        data = match coding.decode(data) {
            Ok(out) => out,
            Err(source) => {
                return Err(DecodeError {
                    position,
                    coding,
                    source,
                })
            }
        };
    }
    Ok(data)
}

/// Decodes a response body to text. Never fails.
///
/// - No header (or an empty one): the raw body as text.
/// - Any coding fails: the raw body as text, not the partially decoded buffer.
/// - Decoded bytes are not UTF-8: the raw body as text.
pub fn decode_body(raw: &[u8], content_encoding: Option<&str>) -> String {
    let header = content_encoding.map(str::trim).unwrap_or("");
    if header.is_empty() {
        return raw_text(raw);
    }

    match decode_chain(raw, header) {
        Ok(decoded) => match String::from_utf8(decoded) {
            Ok(text) => text,
            Err(_) => {
                tracing::debug!("decoded body is not UTF-8 (encoding {:?}); using raw body", header);
                raw_text(raw)
            }
        },
        Err(err) => {
            tracing::debug!("{}; using raw body", err);
            raw_text(raw)
        }
    }
}

fn raw_text(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}
