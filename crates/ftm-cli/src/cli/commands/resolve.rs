//! `ftm resolve <url>` – resolve one track and optionally save its media.

use anyhow::{Context, Result};
use ftm_core::pipeline::{MediaLocator, ResolveError, TrackMetadata};
use ftm_core::session::CurlSession;
use ftm_core::{FtmConfig, TrackResolver, TrackUrl, Variant};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ResolveArgs {
    pub url: String,
    pub variant: Option<Variant>,
    pub json: bool,
    pub save: bool,
    pub output_dir: PathBuf,
}

pub async fn run_resolve(cfg: FtmConfig, args: ResolveArgs) -> Result<()> {
    tokio::task::spawn_blocking(move || resolve_blocking(cfg, args))
        .await
        .context("resolve task panicked")?
}

fn resolve_blocking(cfg: FtmConfig, args: ResolveArgs) -> Result<()> {
    let url = TrackUrl::parse(&args.url).map_err(ResolveError::from)?;

    // Media is spooled next to its destination so saving is a rename.
    let mut resolver = TrackResolver::new(cfg).with_spool_dir(&args.output_dir);
    if let Some(variant) = args.variant {
        resolver = resolver.with_variant(variant);
    }

    let mut session = CurlSession::new(resolver.config()).map_err(ResolveError::UpstreamUnavailable)?;
    let resolution = resolver.resolve_track(&mut session, &url)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&resolution.to_json())?);
    } else {
        print!("{}", song_info(&resolution.track));
    }

    let file = match resolution.locator {
        MediaLocator::Link(link) => {
            if !args.json {
                println!("Download URL: {}", link);
            }
            if !args.save {
                return Ok(());
            }
            // Same session, so the upstream's cookies still apply.
            resolver
                .download_link(&mut session, &link, &resolution.track)
                .with_context(|| format!("download {}", link))?
        }
        MediaLocator::File(file) => file,
    };

    let path = file
        .persist_in(&args.output_dir)
        .with_context(|| format!("save into {}", args.output_dir.display()))?;
    println!("File downloaded: {}", path.display());
    Ok(())
}

/// The "Song Info" block; absent fields read "Unknown".
fn song_info(track: &TrackMetadata) -> String {
    let show = |v: Option<String>| v.unwrap_or_else(|| "Unknown".to_string());
    format!(
        "Song Info:\nTitle: {}\nArtist: {}\nImage: {}\nDuration: {}\nURL: {}\n",
        show(track.title()),
        show(track.artist()),
        show(track.image()),
        show(track.duration()),
        show(track.field_text("url")),
    )
}
