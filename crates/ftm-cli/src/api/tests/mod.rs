//! Router tests: error paths here, upstream round trips in `resolve`.

use super::*;
use axum::body::to_bytes;
use axum::http::{Method, Request, StatusCode};
use tower::ServiceExt;


fn app_for(origin: &str) -> Router {
    router(TrackResolver::new(FtmConfig::with_origin(origin)))
}

fn app() -> Router {
    // Requests in these tests fail before any upstream call.
    app_for("http://127.0.0.1:9")
}

async fn call(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn get_req(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_req(body: &'static str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/ftmdl")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let (status, body) = call(app(), get_req("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["message"], "Spotify Direct Link API is running");
}

#[tokio::test]
async fn get_without_url_is_missing() {
    let (status, body) = call(app(), get_req("/ftmdl")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "URL parameter is missing or invalid");
}

#[tokio::test]
async fn get_with_other_url_is_malformed() {
    let (status, body) = call(
        app(),
        get_req("/ftmdl?url=https%3A%2F%2Fopen.spotify.com%2Falbum%2Fabc"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid Spotify track URL format");
}

#[tokio::test]
async fn post_with_unparsable_body_is_missing() {
    let (status, body) = call(app(), post_req("not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "URL parameter is missing or invalid");
}

#[tokio::test]
async fn post_with_other_url_is_malformed() {
    let (status, body) = call(app(), post_req(r#"{"url":"https://example.com/track/abc"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid Spotify track URL format");
}

#[tokio::test]
async fn other_methods_are_rejected() {
    for method in [Method::PUT, Method::DELETE, Method::PATCH] {
        let req = Request::builder()
            .method(method.clone())
            .uri("/ftmdl")
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(app(), req).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{method}");
        assert_eq!(body["error"], "Only GET and POST allowed");
    }
}

#[tokio::test]
async fn unreachable_upstream_is_503_with_cause() {
    // Grab a free port and close it again so connecting is refused.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let app = app_for(&format!("http://127.0.0.1:{}", port));
    let (status, body) = call(
        app,
        get_req("/ftmdl?url=https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC"),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let msg = body["error"].as_str().unwrap();
    assert!(msg.starts_with("Failed to access the download service: "), "{msg}");
}

#[test]
fn bind_addr_precedence() {
    let mut cfg = FtmConfig::default();
    assert_eq!(resolve_bind_addr(None, None, &cfg), "127.0.0.1:5000");

    cfg.bind_addr = Some("127.0.0.1:7000".to_string());
    assert_eq!(resolve_bind_addr(None, None, &cfg), "127.0.0.1:7000");
    assert_eq!(resolve_bind_addr(None, Some("8080"), &cfg), "0.0.0.0:8080");
    assert_eq!(resolve_bind_addr(None, Some("nope"), &cfg), "127.0.0.1:7000");
    assert_eq!(
        resolve_bind_addr(Some("[::1]:9000"), Some("8080"), &cfg),
        "[::1]:9000"
    );
}
