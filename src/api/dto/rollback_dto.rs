//! Rollback log DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ComparisonResult;

/// Query parameters for the rollback log endpoint.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct RollbackLogParams {
    /// Return at most this many entries (most recent first).
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Counts over the rollback log for the dashboard header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RollbackSummaryDto {
    /// Log entries, i.e. cycles with at least one rollback.
    pub total_rollbacks: usize,
    /// Entries classified as dataset-level.
    pub dataset_level: usize,
    /// Entries classified as row-level.
    pub row_level: usize,
    /// Timestamp of the most recent comparison, rollback or not.
    pub last_check: Option<DateTime<Utc>>,
}

impl RollbackSummaryDto {
    /// Summarises `log`, taking `last_check` from the latest comparison.
    #[must_use]
    pub fn from_log(log: &[ComparisonResult], latest: Option<&ComparisonResult>) -> Self {
        let dataset_level = log.iter().filter(|entry| entry.is_dataset_level).count();
        Self {
            total_rollbacks: log.len(),
            dataset_level,
            row_level: log.len() - dataset_level,
            last_check: latest.map(|result| result.timestamp),
        }
    }
}

/// Sorts log entries most recent first and applies an optional limit.
#[must_use]
pub fn most_recent_first(
    mut log: Vec<ComparisonResult>,
    limit: Option<usize>,
) -> Vec<ComparisonResult> {
    log.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    if let Some(limit) = limit {
        log.truncate(limit);
    }
    log
}
