//! Track URL validation.
//!
//! Only `https://open.spotify.com/track/<id>` URLs are accepted, where `<id>`
//! is alphanumeric and may be followed by a `?query` (share links carry `?si=`).

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static TRACK_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://open\.spotify\.com/track/[A-Za-z0-9]+(?:\?.*)?$")
        .expect("track URL pattern is valid")
});

/// Why an identifier was rejected. Both map to HTTP 400.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackUrlError {
    #[error("URL parameter is missing or invalid")]
    Missing,
    #[error("Invalid Spotify track URL format")]
    Malformed,
}

/// A validated track URL. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackUrl(String);

impl TrackUrl {
    pub fn parse(raw: &str) -> Result<Self, TrackUrlError> {
        if raw.is_empty() {
            return Err(TrackUrlError::Missing);
        }
        if !TRACK_URL.is_match(raw) {
            return Err(TrackUrlError::Malformed);
        }
        Ok(Self(raw.to_string()))
    }

    /// Like [`TrackUrl::parse`] but treats an absent value as missing.
    pub fn parse_opt(raw: Option<&str>) -> Result<Self, TrackUrlError> {
        raw.map(Self::parse).unwrap_or(Err(TrackUrlError::Missing))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The track id segment (without any query).
    pub fn track_id(&self) -> &str {
        let rest = &self.0["https://open.spotify.com/track/".len()..];
        rest.split('?').next().unwrap_or(rest)
    }
}

impl fmt::Display for TrackUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
