//! Latest snapshot handler.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::app_state::AppState;
use crate::domain::{FeedSource, Snapshot};
use crate::error::{ErrorResponse, TrackerError};
use crate::persistence::SnapshotStore;

/// `GET /snapshots/latest/{source}`: Latest stored snapshot of a feed.
///
/// # Errors
///
/// Returns [`TrackerError::InvalidRequest`] for an unknown feed name and
/// [`TrackerError::NotFound`] if the feed has never been captured.
#[utoipa::path(
    get,
    path = "/api/v1/snapshots/latest/{source}",
    tag = "Snapshots",
    summary = "Latest snapshot",
    description = "Returns the most recently stored snapshot for `nsoh` or `thames`.",
    params(
        ("source" = String, Path, description = "Feed name: `nsoh` or `thames`"),
    ),
    responses(
        (status = 200, description = "Snapshot", body = Snapshot),
        (status = 400, description = "Unknown feed", body = ErrorResponse),
        (status = 404, description = "Feed never captured", body = ErrorResponse),
    )
)]
pub async fn latest_snapshot(
    State(state): State<AppState>,
    Path(source): Path<String>,
) -> Result<Json<Snapshot>, TrackerError> {
    let source: FeedSource = source.parse().map_err(TrackerError::InvalidRequest)?;
    state
        .store
        .load_latest(source)
        .await?
        .map(Json)
        .ok_or_else(|| TrackerError::NotFound(format!("no {source} snapshot stored yet")))
}

/// Snapshot routes mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/snapshots/latest/{source}", get(latest_snapshot))
}
