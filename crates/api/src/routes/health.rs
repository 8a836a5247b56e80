use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the database is reachable.
    pub db_healthy: bool,
    /// Whether the form template directory exists.
    pub templates_available: bool,
    /// Sites whose form lists are currently cached.
    pub cached_sites: usize,
}

/// GET /health -- database reachability plus the state of the form caches.
///
/// Only the database decides `status`; a missing template directory breaks
/// rendering but not administration.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = formkit_db::health_check(&state.pool).await.is_ok();
    let templates_available = state.templates.templates_available().await;
    if !templates_available {
        tracing::warn!(
            plugin_root = %state.templates.settings().plugin_root.display(),
            "Form template directory missing"
        );
    }

    Json(HealthResponse {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        templates_available,
        cached_sites: state.forms.cached_sites().await,
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
