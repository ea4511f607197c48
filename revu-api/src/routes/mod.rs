//! REST API Routes Module
//!
//! Route handlers organized by entity type. Paths follow the service's
//! public contract (`/team/*`, `/users/*`, `/pullRequest/*`, `/api/*`).
//!
//! Includes:
//! - Team, user and pull request routes
//! - Assignment statistics
//! - Health check endpoint
//! - OpenAPI document at /openapi.json
//! - CORS support for browser-based clients

pub mod health;
pub mod pull_request;
pub mod stats;
pub mod team;
pub mod users;

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

use crate::config::ApiConfig;
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// GET /openapi.json - OpenAPI document
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the CORS layer from ApiConfig.
///
/// In development mode (empty origins), allows all origins.
/// In production mode, only allows configured origins.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: Development mode - allowing all origins");
        cors.allow_origin(Any)
    } else {
        tracing::info!(
            "CORS: Production mode - allowing origins: {:?}",
            config.cors_origins
        );
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

/// Create the complete API router.
///
/// - Teams at /team/*
/// - Users at /users/*
/// - Pull requests at /pullRequest/* and /api/pull-requests/{id}/reviewers
/// - Statistics at /api/stats
/// - Health at /health
/// - OpenAPI document at /openapi.json
pub fn create_api_router(state: AppState, config: &ApiConfig) -> Router {
    let api_routes = Router::new()
        .nest("/pull-requests", pull_request::create_reviewer_router())
        .merge(stats::create_router());

    Router::new()
        .nest("/team", team::create_router())
        .nest("/users", users::create_router())
        .nest("/pullRequest", pull_request::create_router())
        .nest("/api", api_routes)
        .merge(health::create_router())
        .route("/openapi.json", get(openapi_json))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer(config)),
        )
        .with_state(state)
}
