//! System endpoints: health check and feed catalog.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::domain::FeedSource;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /health`: Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// Monitored feed info.
#[derive(Debug, Serialize, ToSchema)]
pub struct FeedInfo {
    source: FeedSource,
    primary: bool,
    description: &'static str,
}

/// `GET /config/feeds`: List monitored feeds.
#[utoipa::path(
    get,
    path = "/config/feeds",
    tag = "System",
    summary = "List monitored feeds",
    description = "Returns the feeds the tracker captures and which one is checked for rollbacks.",
    responses(
        (status = 200, description = "Feed catalog", body = Vec<FeedInfo>),
    )
)]
pub async fn feeds_handler() -> impl IntoResponse {
    let feeds: Vec<FeedInfo> = FeedSource::ALL
        .into_iter()
        .map(|source| FeedInfo {
            source,
            primary: source.is_primary(),
            description: match source {
                FeedSource::Nsoh => "National Storm Overflow Hub ArcGIS layer (regulator-facing)",
                FeedSource::Thames => "Thames Water open data discharge status (utility-facing)",
            },
        })
        .collect();
    (StatusCode::OK, Json(feeds))
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/feeds", get(feeds_handler))
}
