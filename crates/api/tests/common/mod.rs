//! Shared helpers for the HTTP integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use formkit_api::config::ServerConfig;
use formkit_api::router::build_app_router;
use formkit_api::state::AppState;
use formkit_core::ordering::SwapMode;
use formkit_core::template::{DEFAULT_ASSETS_URL, DEFAULT_TEMPLATES_URL};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults, reading templates from
/// `plugin_root`.
pub fn test_config(plugin_root: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        form_cache_ttl_hours: 12,
        template_cache_ttl_hours: 1,
        plugin_root: plugin_root.to_path_buf(),
        assets_url: DEFAULT_ASSETS_URL.to_string(),
        templates_url: DEFAULT_TEMPLATES_URL.to_string(),
        taxis_swap_mode: SwapMode::Transactional,
    }
}

/// Build the full application router over `pool`. Templates are read from a
/// directory that does not exist.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_templates(pool, &PathBuf::from("/nonexistent/plugin"))
}

/// Build the full application router over `pool`, reading templates from
/// `plugin_root`.
pub fn build_test_app_with_templates(pool: PgPool, plugin_root: &Path) -> Router {
    let config = test_config(plugin_root);
    let state = AppState::new(pool, config.clone());
    build_app_router(state, &config)
}

/// Write `html` as `templates/{dir}/index.html` under `root`.
pub fn write_template(root: &Path, dir: &str, html: &str) {
    let dir = root.join("templates").join(dir);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("index.html"), html).unwrap();
}

async fn send(app: Router, method: Method, uri: &str, body: Option<serde_json::Value>) -> Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None).await
}

pub async fn post(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::POST, uri, None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, None).await
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Collect a response body as text.
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
