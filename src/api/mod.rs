//! Read-only dashboard API: route handlers, DTOs, and router composition.
//!
//! Resource endpoints are mounted under `/api/v1`; health and the feed
//! catalog live at the root.

pub mod dto;
pub mod handlers;

use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// Upper bound on a single dashboard request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// OpenAPI description of the dashboard API.
#[derive(Debug, OpenApi)]
#[openapi(
    paths(
        handlers::system::health_handler,
        handlers::system::feeds_handler,
        handlers::rollback::latest_comparison,
        handlers::rollback::list_rollbacks,
        handlers::rollback::rollback_summary,
        handlers::snapshot::latest_snapshot,
    ),
    tags(
        (name = "System", description = "Service health and configuration"),
        (name = "Rollbacks", description = "Detection verdicts and the rollback log"),
        (name = "Snapshots", description = "Stored feed snapshots"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
}

/// Builds the served application: routes, middleware, state and, with the
/// `swagger-ui` feature, the interactive docs at `/swagger-ui`.
pub fn build_app(state: AppState) -> Router {
    let app = build_router()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    REQUEST_TIMEOUT,
                ))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state);

    #[cfg(feature = "swagger-ui")]
    let app = app.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    app
}
