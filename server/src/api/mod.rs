//! HTTP API for the deployment service.
//!
//! Provides endpoints for:
//! - Starting a deployment (`POST /deploy`)
//! - Instance status (`GET /status?instanceID=`)
//! - Deployment records (`GET /deployments/{identifier}`)
//! - Health checks
//!
//! Every route is served both at the root and under `/api/v2`, the prefix
//! earlier front-ends call.

mod deployments;
mod error;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::application::services::Orchestrator;

pub use deployments::StatusQuery;

/// Path prefix kept for compatibility with existing callers.
pub const LEGACY_PREFIX: &str = "/api/v2";

/// Shared application state for the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

/// Creates the API router.
pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/health", get(health_check))
        .route("/deploy", post(deployments::deploy))
        .route("/status", get(deployments::status))
        .route("/deployments/{identifier}", get(deployments::get_deployment));

    Router::new()
        .merge(routes.clone())
        .nest(LEGACY_PREFIX, routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> axum::Json<HealthResponse> {
    axum::Json(HealthResponse { status: "healthy" })
}

/// Health response.
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
}
