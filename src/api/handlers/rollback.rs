//! Comparison and rollback log handlers.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{RollbackLogParams, RollbackSummaryDto, most_recent_first};
use crate::app_state::AppState;
use crate::domain::ComparisonResult;
use crate::error::{ErrorResponse, TrackerError};
use crate::persistence::SnapshotStore;

/// `GET /comparison/latest`: Verdict of the most recent cycle.
///
/// # Errors
///
/// Returns [`TrackerError::NotFound`] before the first comparison and a
/// storage error if the slot cannot be read.
#[utoipa::path(
    get,
    path = "/api/v1/comparison/latest",
    tag = "Rollbacks",
    summary = "Latest comparison",
    description = "Returns the result of the most recent detection cycle, whether or not it found rollbacks.",
    responses(
        (status = 200, description = "Latest comparison", body = ComparisonResult),
        (status = 404, description = "No comparison recorded yet", body = ErrorResponse),
    )
)]
pub async fn latest_comparison(
    State(state): State<AppState>,
) -> Result<Json<ComparisonResult>, TrackerError> {
    state
        .store
        .load_latest_comparison()
        .await?
        .map(Json)
        .ok_or_else(|| TrackerError::NotFound("no comparison has been recorded yet".to_string()))
}

/// `GET /rollbacks`: Rollback log, most recent first.
///
/// # Errors
///
/// Returns a storage error if the log cannot be read.
#[utoipa::path(
    get,
    path = "/api/v1/rollbacks",
    tag = "Rollbacks",
    summary = "List rollback log entries",
    description = "Returns every cycle that detected at least one rollback, most recent first.",
    params(RollbackLogParams),
    responses(
        (status = 200, description = "Rollback log", body = Vec<ComparisonResult>),
        (status = 500, description = "Log unreadable", body = ErrorResponse),
    )
)]
pub async fn list_rollbacks(
    State(state): State<AppState>,
    Query(params): Query<RollbackLogParams>,
) -> Result<Json<Vec<ComparisonResult>>, TrackerError> {
    let log = state.store.load_rollback_log().await?;
    Ok(Json(most_recent_first(log, params.limit)))
}

/// `GET /rollbacks/summary`: Counts over the rollback log.
///
/// # Errors
///
/// Returns a storage error if the log or latest comparison cannot be read.
#[utoipa::path(
    get,
    path = "/api/v1/rollbacks/summary",
    tag = "Rollbacks",
    summary = "Rollback log summary",
    description = "Counts dataset-level and row-level rollbacks and reports when the last check ran.",
    responses(
        (status = 200, description = "Summary", body = RollbackSummaryDto),
        (status = 500, description = "State unreadable", body = ErrorResponse),
    )
)]
pub async fn rollback_summary(
    State(state): State<AppState>,
) -> Result<Json<RollbackSummaryDto>, TrackerError> {
    let log = state.store.load_rollback_log().await?;
    let latest = state.store.load_latest_comparison().await?;
    Ok(Json(RollbackSummaryDto::from_log(&log, latest.as_ref())))
}

/// Rollback routes mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/comparison/latest", get(latest_comparison))
        .route("/rollbacks", get(list_rollbacks))
        .route("/rollbacks/summary", get(rollback_summary))
}
