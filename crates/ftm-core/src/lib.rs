//! ftm core: resolves a track URL into metadata and a media locator by
//! relaying through an upstream service that sits behind anti-automation
//! defenses.

pub mod config;
pub mod decode;
pub mod filename;
pub mod logging;
pub mod pipeline;
pub mod session;
pub mod track_url;

pub use config::FtmConfig;
pub use pipeline::{MediaLocator, Resolution, ResolveError, TrackResolver, Variant};
pub use track_url::TrackUrl;
