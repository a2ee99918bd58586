//! `ftm serve` – run the HTTP API.

use anyhow::Result;
use ftm_core::{FtmConfig, TrackResolver, Variant};

use crate::api;

pub async fn run_serve(
    cfg: FtmConfig,
    bind: Option<String>,
    variant: Option<Variant>,
    proxy_media: bool,
) -> Result<()> {
    let addr = api::resolve_bind_addr(bind.as_deref(), std::env::var("PORT").ok().as_deref(), &cfg);
    let mut resolver = TrackResolver::new(cfg);
    if let Some(variant) = variant {
        resolver = resolver.with_variant(variant);
    }
    if proxy_media {
        resolver = resolver.with_proxy_media(true);
    }
    println!(
        "Serving on http://{} ({}{})",
        addr,
        resolver.variant(),
        if resolver.config().proxy_media { ", proxying media" } else { "" }
    );
    api::serve(resolver, &addr).await
}
