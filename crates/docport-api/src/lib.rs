//! docport-api - HTTP API for document conversion.
//!
//! The binary in `main.rs` wires configuration, logging and lifecycle; this
//! library holds the router so tests can serve it on an ephemeral port.

pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod openapi;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use docport_convert::ConversionPipeline;

pub use config::ServiceConfig;
pub use error::ApiError;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ConversionPipeline>,
    pub config: Arc<ServiceConfig>,
}

impl AppState {
    pub fn new(pipeline: Arc<ConversionPipeline>, config: ServiceConfig) -> Self {
        Self {
            pipeline,
            config: Arc::new(config),
        }
    }
}

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// ROUTER
// =============================================================================

/// Build the application router.
pub fn app(state: AppState) -> Router {
    let max_body = state.config.max_content_length;

    Router::new()
        .route("/", get(handlers::system::index))
        // Health check
        .route("/health", get(handlers::system::health))
        .route("/health/reprobe", post(handlers::system::reprobe))
        // Conversion
        .route("/convert", post(handlers::convert::convert))
        .route("/download/*path", get(handlers::download::download))
        // OpenAPI / Swagger UI
        .merge(SwaggerUi::new("/docs").url("/apispec.json", openapi::ApiDoc::openapi()))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT]),
        )
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body))
        .with_state(state)
}
