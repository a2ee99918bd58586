//! Resolution pipeline: track URL → metadata → media locator.
//!
//! States, in order: validate the URL, prime a fresh session against the
//! upstream origin, fetch metadata, then (depending on [`Variant`]) resolve
//! the media through a second call. Each step only runs after the previous
//! one succeeded; the first failure is terminal and there are no retries.

mod error;
mod locator;
mod metadata;

pub use error::{DownloadError, ErrorKind, MetadataError, ResolveError};
pub use locator::{DownloadedFile, MediaLocator};
pub use metadata::TrackMetadata;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;

use crate::config::FtmConfig;
use crate::filename;
use crate::session::{CurlSession, ResponseHead, TransportError, UpstreamSession};
use crate::track_url::TrackUrl;

/// Upstream metadata endpoint, relative to the origin.
pub const TRACK_INFO_PATH: &str = "track-info";
/// Upstream media endpoint, relative to the origin.
pub const DOWNLOAD_PATH: &str = "download";

/// How the upstream hands out the media. Its contract has changed over time;
/// all three shapes have been observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// Metadata already carries the direct link (`url` or `link`).
    EmbeddedLink,
    /// `POST /download` redirects to the file; the final URL is the locator.
    #[default]
    TwoCallRedirect,
    /// `POST /download` answers with the file itself.
    TwoCallStream,
}

impl Variant {
    pub const ALL: [Variant; 3] = [
        Variant::EmbeddedLink,
        Variant::TwoCallRedirect,
        Variant::TwoCallStream,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::EmbeddedLink => "embedded-link",
            Variant::TwoCallRedirect => "two-call-redirect",
            Variant::TwoCallStream => "two-call-stream",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variant::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown variant `{}` (expected embedded-link, two-call-redirect or two-call-stream)",
                    s
                )
            })
    }
}

/// Successful outcome: the track and where its media is.
#[derive(Debug)]
pub struct Resolution {
    pub track: TrackMetadata,
    pub locator: MediaLocator,
}

impl Resolution {
    /// The JSON document returned to callers:
    /// `{"trackinfo": {...}, "downloadurl": "..."}` for links,
    /// `{"trackinfo": {...}, "filename": "..."}` for downloaded files.
    pub fn to_json(&self) -> Value {
        match &self.locator {
            MediaLocator::Link(url) => json!({ "trackinfo": self.track, "downloadurl": url }),
            MediaLocator::File(file) => json!({
                "trackinfo": self.track,
                "filename": file.filename(),
                "size": file.len(),
            }),
        }
    }
}

/// Runs the pipeline with a configuration. Cheap to clone; holds no session.
#[derive(Debug, Clone)]
pub struct TrackResolver {
    cfg: FtmConfig,
}

impl TrackResolver {
    pub fn new(cfg: FtmConfig) -> Self {
        Self { cfg }
    }

    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.cfg.variant = variant;
        self
    }

    /// Hand out linked media as a file fetched through the resolving session.
    pub fn with_proxy_media(mut self, proxy: bool) -> Self {
        self.cfg.proxy_media = proxy;
        self
    }

    /// Spool streamed media into `dir` instead of the configured/system temp dir.
    pub fn with_spool_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cfg.spool_dir = Some(dir.into());
        self
    }

    pub fn config(&self) -> &FtmConfig {
        &self.cfg
    }

    pub fn variant(&self) -> Variant {
        self.cfg.variant
    }

    /// Resolves `raw` with a fresh curl session, dropped before returning.
    pub fn resolve(&self, raw: &str) -> Result<Resolution, ResolveError> {
        self.resolve_with(raw, || CurlSession::new(&self.cfg))
    }

    /// Validates `raw`, then opens a session with `connect` and resolves.
    /// `connect` is not called for invalid input.
    pub fn resolve_with<S, F>(&self, raw: &str, connect: F) -> Result<Resolution, ResolveError>
    where
        S: UpstreamSession,
        F: FnOnce() -> Result<S, TransportError>,
    {
        let url = TrackUrl::parse(raw)?;
        let mut session = connect().map_err(ResolveError::UpstreamUnavailable)?;
        self.resolve_track(&mut session, &url)
    }

    /// Runs every upstream step through `session`, which the caller may keep
    /// using afterwards (e.g. to fetch a resolved link with the same cookies).
    ///
    /// With `proxy_media` set, a link locator is fetched through the same
    /// session and handed out as a file.
    pub fn resolve_track<S>(&self, session: &mut S, url: &TrackUrl) -> Result<Resolution, ResolveError>
    where
        S: UpstreamSession + ?Sized,
    {
        tracing::info!(track = url.track_id(), "resolving {} ({})", url, self.cfg.variant);

        match session.prime() {
            Ok(status) if !(200..300).contains(&status) => {
                // Challenge pages answer 403/503 but still set their cookies.
                tracing::debug!("priming answered HTTP {}; continuing", status);
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("upstream unreachable: {}", e);
                return Err(ResolveError::UpstreamUnavailable(e));
            }
        }

        let track = self.fetch_metadata(session, url).map_err(|e| {
            tracing::warn!("metadata for {}: {}", url, e);
            ResolveError::MetadataMissing(e)
        })?;

        let locator = match self.cfg.variant {
            Variant::EmbeddedLink => match track.direct_link() {
                Some(link) => MediaLocator::Link(link.to_string()),
                None => {
                    tracing::warn!("metadata for {}: {}", url, MetadataError::MissingLink);
                    return Err(ResolveError::MetadataMissing(MetadataError::MissingLink));
                }
            },
            Variant::TwoCallRedirect | Variant::TwoCallStream => self
                .resolve_media(session, url, &track)
                .map_err(|e| {
                    tracing::warn!("media for {}: {}", url, e);
                    ResolveError::DownloadFailed(e)
                })?,
        };

        let locator = match locator {
            MediaLocator::Link(link) if self.cfg.proxy_media => {
                let file = self.download_link(session, &link, &track).map_err(|e| {
                    tracing::warn!("proxying {}: {}", link, e);
                    ResolveError::DownloadFailed(e)
                })?;
                MediaLocator::File(file)
            }
            other => other,
        };

        tracing::info!("resolved {}", url);
        Ok(Resolution { track, locator })
    }

    /// GETs a resolved link through `session` into a spool file named after
    /// the response's `Content-Disposition`, or the track when it has none.
    pub fn download_link<S>(
        &self,
        session: &mut S,
        link: &str,
        track: &TrackMetadata,
    ) -> Result<DownloadedFile, DownloadError>
    where
        S: UpstreamSession + ?Sized,
    {
        self.spool_media(track, |spool| session.get_into(link, spool))
    }

    /// Completeness check for the two-call variants; the embedded link is
    /// checked where the locator is built.
    fn fetch_metadata<S>(&self, session: &mut S, url: &TrackUrl) -> Result<TrackMetadata, MetadataError>
    where
        S: UpstreamSession + ?Sized,
    {
        let response = session
            .post_json(TRACK_INFO_PATH, &json!({ "url": url.as_str() }))
            .map_err(MetadataError::Transport)?;
        let text = response.text();
        tracing::debug!(
            bytes = response.body.len(),
            encoding = response.head.headers.content_encoding.as_deref().unwrap_or(""),
            "metadata response"
        );

        let track = TrackMetadata::from_json_text(&text)?;
        if self.cfg.variant != Variant::EmbeddedLink {
            track.require_title_and_artist()?;
        }
        Ok(track)
    }

    fn resolve_media<S>(
        &self,
        session: &mut S,
        url: &TrackUrl,
        track: &TrackMetadata,
    ) -> Result<MediaLocator, DownloadError>
    where
        S: UpstreamSession + ?Sized,
    {
        let payload = json!({
            "title": track.field("title"),
            "artist": track.field("artist"),
            "url": url.as_str(),
        });

        if self.cfg.variant == Variant::TwoCallRedirect {
            let link = session
                .post_json_follow(DOWNLOAD_PATH, &payload)
                .map_err(DownloadError::Transport)?;
            tracing::debug!("download redirected to {}", link);
            return Ok(MediaLocator::Link(link));
        }

        let file = self.spool_media(track, |spool| {
            session.post_json_into(DOWNLOAD_PATH, &payload, spool)
        })?;
        Ok(MediaLocator::File(file))
    }

    /// Runs `transfer` into a fresh spool file and names the result.
    fn spool_media<F>(&self, track: &TrackMetadata, transfer: F) -> Result<DownloadedFile, DownloadError>
    where
        F: FnOnce(&mut dyn Write) -> Result<ResponseHead, TransportError>,
    {
        let mut spool = self.spool_file().map_err(DownloadError::Spool)?;
        let head = transfer(&mut spool).map_err(DownloadError::Transport)?;
        spool.flush().map_err(DownloadError::Spool)?;
        let len = spool
            .as_file()
            .metadata()
            .map_err(DownloadError::Spool)?
            .len();
        if let Some(advertised) = head.headers.content_length {
            if advertised != len {
                tracing::warn!("media body is {} bytes, Content-Length said {}", len, advertised);
            }
        }

        let title = track.title().unwrap_or_else(|| "Unknown".to_string());
        let artist = track.artist().unwrap_or_else(|| "Unknown".to_string());
        let name = filename::derive_filename(head.headers.content_disposition.as_deref(), &title, &artist);
        tracing::debug!("downloaded {} bytes as {:?}", len, name);
        Ok(DownloadedFile::new(spool, name, len))
    }

    fn spool_file(&self) -> std::io::Result<tempfile::NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(".ftm-").suffix(".part");
        match &self.cfg.spool_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
    }
}
