// Newsdesk Control Plane Library
// Decision: Shared library for binaries (API server, hash-password, export-openapi)
// Decision: Router assembly lives here so in-process tests exercise the exact server stack

// API routes and types (shared for OpenAPI generation)
pub mod api;

// Authentication module
pub mod auth;

// Environment configuration
pub mod config;

// OpenAPI spec generation
pub mod openapi;

// Store adapters
pub mod storage;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::{middleware, routing::get, Json, Router};
use newsdesk_core::ArticleRepository;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::api::articles::ArticlesState;
use crate::auth::{AuthState, API_KEY_HEADER};

/// Everything the HTTP layer needs
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<ArticleRepository>,
    pub auth: AuthState,
    pub legacy_error_status: bool,
    pub max_upload_bytes: usize,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi::ApiDoc::openapi())
}

/// Permissive CORS: the publisher UI is served from another origin
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            API_KEY_HEADER.clone(),
        ])
}

/// Assemble the full HTTP application
///
/// Layers wrap outward: the body limit applies inside CORS, and the
/// `OPTIONS /delete` body is filled in after CORS has answered.
pub fn build_router(state: AppState) -> Router {
    let articles_state = ArticlesState {
        repository: state.repository,
        auth: state.auth.clone(),
        legacy_error_status: state.legacy_error_status,
    };

    Router::new()
        .route("/health", get(health))
        .route("/api-doc/openapi.json", get(openapi_json))
        .merge(auth::routes(state.auth))
        .merge(api::articles::routes(articles_state))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(cors_layer())
        .layer(middleware::from_fn(api::articles::delete_preflight_body))
        .layer(TraceLayer::new_for_http())
}
