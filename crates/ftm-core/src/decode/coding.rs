//! Individual content codings and their decoders.

use std::fmt;
use std::io::{self, Read};

/// One token of a `Content-Encoding` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentCoding {
    Brotli,
    Gzip,
    Zstd,
    /// A coding we have no decoder for (`deflate`, `identity`, ...). Left as is.
    Passthrough(String),
}

impl ContentCoding {
    /// Parses a single trimmed header token. Returns `None` for empty tokens.
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        let coding = if token.eq_ignore_ascii_case("br") {
            ContentCoding::Brotli
        } else if token.eq_ignore_ascii_case("gzip") || token.eq_ignore_ascii_case("x-gzip") {
            ContentCoding::Gzip
        } else if token.eq_ignore_ascii_case("zstd") {
            ContentCoding::Zstd
        } else {
            ContentCoding::Passthrough(token.to_string())
        };
        Some(coding)
    }

    /// Undoes this coding on `data`.
    pub fn decode(&self, data: Vec<u8>) -> io::Result<Vec<u8>> {
        match self {
            ContentCoding::Brotli => {
                let mut out = Vec::with_capacity(data.len() * 4);
                brotli::Decompressor::new(data.as_slice(), 4096).read_to_end(&mut out)?;
                Ok(out)
            }
            ContentCoding::Gzip => {
                let mut out = Vec::with_capacity(data.len() * 4);
                flate2::read::MultiGzDecoder::new(data.as_slice()).read_to_end(&mut out)?;
                Ok(out)
            }
            ContentCoding::Zstd => zstd::stream::decode_all(data.as_slice()),
            ContentCoding::Passthrough(_) => Ok(data),
        }
    }
}

impl fmt::Display for ContentCoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentCoding::Brotli => f.write_str("br"),
            ContentCoding::Gzip => f.write_str("gzip"),
            ContentCoding::Zstd => f.write_str("zstd"),
            ContentCoding::Passthrough(name) => f.write_str(name),
        }
    }
}

/// Splits a header value into codings, in header order.
pub fn parse_content_encoding(header_value: &str) -> Vec<ContentCoding> {
    header_value
        .split(',')
        .filter_map(ContentCoding::from_token)
        .collect()
}
