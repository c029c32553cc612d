//! Health and informational endpoints.

use axum::extract::State;
use axum::response::Html;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use docport_core::EngineStatus;

use crate::AppState;

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Service health.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Always `healthy` while the server is answering.
    pub status: String,
    /// Whether the LibreOffice engine is usable.
    pub libreoffice: bool,
    /// Engine version, or the probe's diagnostic when unavailable.
    pub version: String,
    /// When the engine was last probed.
    pub engine_checked_at: DateTime<Utc>,
    /// Artifact store root.
    pub data_dir: String,
    /// Retention window in hours; null when files never expire.
    pub file_expiry_hours: Option<u64>,
    /// Service version.
    pub service_version: String,
}

impl HealthResponse {
    fn build(state: &AppState, engine: EngineStatus) -> Self {
        Self {
            status: "healthy".to_string(),
            libreoffice: engine.available,
            version: engine.info,
            engine_checked_at: engine.checked_at,
            data_dir: state.config.data_dir.display().to_string(),
            file_expiry_hours: state.config.retention.hours(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Health check.
///
/// Reports the cached engine status; it does not re-run the probe.
#[utoipa::path(get, path = "/health", tag = "System",
    responses((status = 200, description = "Service health", body = HealthResponse)))]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let engine = state.pipeline.engine_status().await;
    Json(HealthResponse::build(&state, engine))
}

/// Re-probe the conversion engine and report the refreshed health.
#[utoipa::path(post, path = "/health/reprobe", tag = "System",
    responses((status = 200, description = "Service health after re-probing", body = HealthResponse)))]
pub async fn reprobe(State(state): State<AppState>) -> Json<HealthResponse> {
    let engine = state.pipeline.reprobe().await;
    Json(HealthResponse::build(&state, engine))
}

/// Informational landing page.
#[utoipa::path(get, path = "/", tag = "System",
    responses((status = 200, description = "HTML landing page", content_type = "text/html")))]
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
