//! Transport-level error for upstream calls.

use std::fmt;

/// Why a single upstream call failed.
///
/// The pipeline maps these onto its own error kinds depending on which call
/// failed; the variant is kept as the low-level cause.
#[derive(Debug)]
pub enum TransportError {
    /// Curl reported an error (DNS, connect, TLS, timeout, ...).
    Curl(curl::Error),
    /// HTTP response had a non-2xx status.
    Http(u32),
    /// Writing the response body locally failed.
    Io(std::io::Error),
    /// The endpoint URL could not be built from the configured origin.
    Url(url::ParseError),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Curl(e) => write!(f, "{}", e),
            TransportError::Http(code) => write!(f, "HTTP {}", code),
            TransportError::Io(e) => write!(f, "local write: {}", e),
            TransportError::Url(e) => write!(f, "invalid URL: {}", e),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Curl(e) => Some(e),
            TransportError::Io(e) => Some(e),
            TransportError::Url(e) => Some(e),
            TransportError::Http(_) => None,
        }
    }
}

impl From<curl::Error> for TransportError {
    fn from(e: curl::Error) -> Self {
        TransportError::Curl(e)
    }
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        TransportError::Io(e)
    }
}

impl From<url::ParseError> for TransportError {
    fn from(e: url::ParseError) -> Self {
        TransportError::Url(e)
    }
}
