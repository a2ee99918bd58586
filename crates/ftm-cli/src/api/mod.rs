//! HTTP API served by `ftm serve`.
//!
//! - `GET /` health check.
//! - `GET /ftmdl?url=...` and `POST /ftmdl` with `{"url": ...}` resolve a
//!   track. Link locators answer JSON; file locators stream the media. With
//!   `proxy_media` every locator is a file.
//!
//! Each request resolves on the blocking pool with its own upstream session.

mod body;
mod error;

pub use error::ApiError;

use anyhow::{Context, Result};
use axum::{
    body::{Body, Bytes},
    extract::{Query, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE},
        HeaderMap, HeaderValue,
    },
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use ftm_core::config::{FtmConfig, DEFAULT_BIND_ADDR};
use ftm_core::filename;
use ftm_core::{MediaLocator, Resolution, TrackResolver};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use body::SpooledReader;

#[derive(Clone)]
pub struct AppState {
    resolver: Arc<TrackResolver>,
}

#[derive(Debug, Deserialize)]
struct UrlParams {
    url: Option<String>,
}

pub fn router(resolver: TrackResolver) -> Router {
    let state = AppState {
        resolver: Arc::new(resolver),
    };
    Router::new()
        .route("/", get(health))
        .route(
            "/ftmdl",
            get(ftmdl_get).post(ftmdl_post).fallback(method_not_allowed),
        )
        .with_state(state)
}

/// `--bind`, else `PORT` (all interfaces), else the config file, else the default.
pub fn resolve_bind_addr(cli_bind: Option<&str>, port_env: Option<&str>, cfg: &FtmConfig) -> String {
    if let Some(bind) = cli_bind.map(str::trim).filter(|s| !s.is_empty()) {
        return bind.to_string();
    }
    if let Some(port) = port_env.and_then(|v| v.trim().parse::<u16>().ok()) {
        return format!("0.0.0.0:{}", port);
    }
    if let Some(bind) = cfg.bind_addr.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        return bind.to_string();
    }
    DEFAULT_BIND_ADDR.to_string()
}

pub async fn serve(resolver: TrackResolver, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {}", addr))?;
    tracing::info!("listening on {} ({})", addr, resolver.variant());
    axum::serve(listener, router(resolver))
        .await
        .context("HTTP server failed")
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Spotify Direct Link API is running",
    }))
}

async fn ftmdl_get(
    State(state): State<AppState>,
    Query(params): Query<UrlParams>,
) -> Result<Response, ApiError> {
    resolve_request(state, params.url).await
}

async fn ftmdl_post(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    // An unparsable body is treated like a missing identifier.
    let url = serde_json::from_slice::<UrlParams>(&body)
        .ok()
        .and_then(|params| params.url);
    resolve_request(state, url).await
}

async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}

async fn resolve_request(state: AppState, url: Option<String>) -> Result<Response, ApiError> {
    let raw = url.unwrap_or_default();
    let resolver = state.resolver.clone();
    let resolution = tokio::task::spawn_blocking(move || resolver.resolve(&raw))
        .await
        .map_err(|e| ApiError::internal(format!("resolve task failed: {}", e)))??;
    respond(resolution)
}

fn respond(resolution: Resolution) -> Result<Response, ApiError> {
    let json = resolution.to_json();
    let file = match resolution.locator {
        MediaLocator::Link(_) => return Ok(Json(json).into_response()),
        MediaLocator::File(file) => file,
    };

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("audio/mpeg"));
    headers.insert(CONTENT_LENGTH, HeaderValue::from(file.len()));
    headers.insert(
        CONTENT_DISPOSITION,
        HeaderValue::from_str(&filename::attachment_disposition(file.filename()))
            .map_err(|_| ApiError::internal("invalid filename for Content-Disposition"))?,
    );

    let reader = SpooledReader::open(file)
        .map_err(|e| ApiError::internal(format!("open spooled media: {}", e)))?;
    let body = Body::from_stream(ReaderStream::new(reader));
    Ok((headers, body).into_response())
}

#[cfg(test)]
mod tests;
