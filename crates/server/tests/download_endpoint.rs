//! In-process tests for the file retrieval endpoint.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use clipferry_core::config::{
    BotConfig, Config, DownloaderConfig, ServerConfig, StoreConfig,
};
use clipferry_core::ExpiringFileStore;
use clipferry_server::api::create_router;
use clipferry_server::state::AppState;

struct TestApp {
    router: Router,
    store: Arc<ExpiringFileStore>,
    _temp: TempDir,
}

fn test_app() -> TestApp {
    let temp = TempDir::new().unwrap();
    let store_config = StoreConfig {
        dir: temp.path().join("store"),
        retention_hours: 24,
        sweep_interval_secs: 3600,
    };
    let config = Config {
        bot: BotConfig {
            token: "123:test".to_string(),
        },
        server: ServerConfig::default(),
        store: store_config.clone(),
        downloader: DownloaderConfig::default(),
    };

    let store = Arc::new(ExpiringFileStore::new(store_config));
    let state = Arc::new(AppState::new(config, Arc::clone(&store)));

    TestApp {
        router: create_router(state),
        store,
        _temp: temp,
    }
}

async fn register_file(app: &TestApp, name: &str, content: &[u8]) -> String {
    let src = app._temp.path().join(name);
    tokio::fs::write(&src, content).await.unwrap();
    app.store.register(&src, name).await.unwrap()
}

async fn get(router: Router, uri: &str) -> axum::response::Response {
    router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_download_streams_stored_file() {
    let app = test_app();
    let handle = register_file(&app, "clip.mp4", b"video payload").await;

    let response = get(app.router.clone(), &format!("/download/{}", handle)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"clip.mp4\""
    );
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "13");

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"video payload");
}

#[tokio::test]
async fn test_download_unknown_handle_is_404() {
    let app = test_app();

    let response = get(app.router.clone(), "/download/deadbeef").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"File not found or expired");
}

#[tokio::test]
async fn test_download_link_is_single_use() {
    let app = test_app();
    let handle = register_file(&app, "clip.mp4", b"x").await;

    let first = get(app.router.clone(), &format!("/download/{}", handle)).await;
    assert_eq!(first.status(), StatusCode::OK);

    // The sweep reclaims retrieved entries
    app.store.sweep().await;

    let second = get(app.router.clone(), &format!("/download/{}", handle)).await;
    assert_eq!(second.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app();

    let response = get(app.router.clone(), "/api/v1/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_config_endpoint_redacts_token() {
    let app = test_app();

    let response = get(app.router.clone(), "/api/v1/config").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(!text.contains("123:test"));

    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["bot"]["token_configured"], true);
}
