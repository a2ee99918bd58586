//! Error taxonomy of the resolution pipeline.
//!
//! Every failure of a resolution lands in exactly one [`ResolveError`] kind.
//! Callers show [`ResolveError::public_message`]; the full `Display` (with the
//! low-level cause) is meant for logs.

use crate::session::TransportError;
use crate::track_url::TrackUrlError;

/// Why the metadata step produced no usable track.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("metadata call failed: {0}")]
    Transport(#[source] TransportError),
    #[error("metadata body is not JSON: {0}")]
    Json(#[source] serde_json::Error),
    #[error("metadata is not a JSON object")]
    NotAnObject,
    #[error("metadata has no `{0}`")]
    MissingField(&'static str),
    #[error("metadata carries no direct link (`url` or `link`)")]
    MissingLink,
}

/// Why the media step produced no locator.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("download call failed: {0}")]
    Transport(#[source] TransportError),
    #[error("spool file: {0}")]
    Spool(#[source] std::io::Error),
}

/// Coarse error kind, one per terminal failure state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    UpstreamUnavailable,
    MetadataMissing,
    DownloadFailed,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error(transparent)]
    Validation(#[from] TrackUrlError),
    #[error("Failed to access the download service: {0}")]
    UpstreamUnavailable(#[source] TransportError),
    #[error("Failed to retrieve complete track metadata from the source: {0}")]
    MetadataMissing(#[source] MetadataError),
    #[error("Failed to resolve the direct download link: {0}")]
    DownloadFailed(#[source] DownloadError),
}

impl ResolveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolveError::Validation(_) => ErrorKind::Validation,
            ResolveError::UpstreamUnavailable(_) => ErrorKind::UpstreamUnavailable,
            ResolveError::MetadataMissing(_) => ErrorKind::MetadataMissing,
            ResolveError::DownloadFailed(_) => ErrorKind::DownloadFailed,
        }
    }

    /// HTTP status for the API surface.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation => 400,
            ErrorKind::UpstreamUnavailable => 503,
            ErrorKind::MetadataMissing | ErrorKind::DownloadFailed => 500,
        }
    }

    /// Fixed message for the kind. Only the unreachable case carries its cause,
    /// so operators can tell DNS from TLS from timeouts.
    pub fn public_message(&self) -> String {
        match self {
            ResolveError::Validation(e) => e.to_string(),
            ResolveError::UpstreamUnavailable(_) => self.to_string(),
            ResolveError::MetadataMissing(_) => {
                "Failed to retrieve complete track metadata from the source".to_string()
            }
            ResolveError::DownloadFailed(_) => "Failed to resolve the direct download link".to_string(),
        }
    }
}
