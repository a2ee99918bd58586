use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::pipeline::Variant;

/// Relay service that fronts the anti-automation layer.
pub const DEFAULT_ORIGIN: &str = "https://spotifysave.com";

/// A current desktop Chrome; the upstream rejects obviously scripted agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/140.0.0.0 Safari/537.36";

/// Bind address for `ftm serve` when nothing else is configured.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";

/// Global configuration loaded from `~/.config/ftm/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FtmConfig {
    /// Upstream origin, without a trailing path (e.g. "https://spotifysave.com").
    pub origin: String,
    /// User-Agent sent on every upstream call.
    pub user_agent: String,
    /// How the upstream hands out media: "embedded-link", "two-call-redirect" or "two-call-stream".
    #[serde(default)]
    pub variant: Variant,
    /// Connect timeout per upstream call, in seconds.
    pub connect_timeout_secs: u64,
    /// Total timeout for the priming and metadata calls, in seconds.
    pub timeout_secs: u64,
    /// Total timeout for the media call (covers a full file body in stream mode), in seconds.
    pub download_timeout_secs: u64,
    /// Redirects followed when resolving the media link.
    pub max_redirections: u32,
    /// Directory for spooled media files (None = system temp dir).
    #[serde(default)]
    pub spool_dir: Option<PathBuf>,
    /// Listen address for `ftm serve` (overridden by `--bind` and `PORT`).
    #[serde(default)]
    pub bind_addr: Option<String>,
    /// Fetch linked media through the resolving session and hand out the
    /// bytes instead of the link.
    #[serde(default)]
    pub proxy_media: bool,
}

impl Default for FtmConfig {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            variant: Variant::default(),
            connect_timeout_secs: 15,
            timeout_secs: 60,
            download_timeout_secs: 300,
            max_redirections: 10,
            spool_dir: None,
            bind_addr: None,
            proxy_media: false,
        }
    }
}

impl FtmConfig {
    /// Config pointing at another origin; everything else default. Handy for local stubs.
    pub fn with_origin(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Self::default()
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    /// Origin without a trailing slash, as sent in the `Origin` header.
    pub fn origin_trimmed(&self) -> &str {
        self.origin.trim_end_matches('/')
    }

    /// Absolute URL of `path` on the upstream origin.
    pub fn endpoint(&self, path: &str) -> Result<url::Url> {
        let base = url::Url::parse(&format!("{}/", self.origin_trimmed()))
            .with_context(|| format!("invalid upstream origin: {}", self.origin))?;
        base.join(path.trim_start_matches('/'))
            .with_context(|| format!("invalid endpoint path: {}", path))
    }

    /// Checks what serde can't: the origin must be an absolute http(s) URL.
    pub fn validate(&self) -> Result<()> {
        let url = self.endpoint("")?;
        if url.scheme() != "http" && url.scheme() != "https" {
            anyhow::bail!("upstream origin must be http or https: {}", self.origin);
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("ftm")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FtmConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = FtmConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: FtmConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}
