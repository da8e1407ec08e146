//! Rollback evidence and per-cycle verdicts.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Evidence that one location's timestamps moved backwards.
///
/// Carries both the `status_start` and `last_updated` pairs even when only
/// one of them regressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RollbackEvent {
    /// Location that regressed.
    pub location_id: String,
    /// When the comparison ran (not when the regression happened).
    pub detected_at: DateTime<Utc>,
    /// `status_start` in the previous primary snapshot.
    pub previous_status_start: Option<i64>,
    /// `status_start` in the current primary snapshot.
    pub current_status_start: Option<i64>,
    /// `last_updated` in the previous primary snapshot.
    pub previous_last_updated: Option<i64>,
    /// `last_updated` in the current primary snapshot.
    pub current_last_updated: Option<i64>,
    /// `status_start` reported by the secondary feed for the same location.
    pub thames_status_start: Option<i64>,
    /// Whether the categorical status also changed.
    pub status_changed: bool,
}

/// Severity of a cycle with at least one rollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RollbackLevel {
    /// Isolated locations regressed.
    Row,
    /// More than half of all locations regressed at once.
    Dataset,
}

impl RollbackLevel {
    /// Returns the label used in logs and the dashboard.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Row => "ROW-LEVEL",
            Self::Dataset => "DATASET-LEVEL",
        }
    }
}

impl fmt::Display for RollbackLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate verdict of one detection cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ComparisonResult {
    /// Detection instant, shared with every event's `detected_at`.
    pub timestamp: DateTime<Utc>,
    /// Records in the current primary snapshot.
    pub total_locations: usize,
    /// Number of rollback events.
    pub rollbacks_detected: usize,
    /// `100 * rollbacks_detected / total_locations`, two decimals.
    pub rollback_percentage: f64,
    /// `rollback_percentage > 50`.
    pub is_dataset_level: bool,
    /// Events in current-snapshot order.
    #[serde(default)]
    pub rollback_events: Vec<RollbackEvent>,
}

impl ComparisonResult {
    /// Returns `true` if any location rolled back.
    #[must_use]
    pub const fn has_rollbacks(&self) -> bool {
        self.rollbacks_detected > 0
    }

    /// Returns the severity, or `None` for a clean cycle.
    #[must_use]
    pub const fn level(&self) -> Option<RollbackLevel> {
        if !self.has_rollbacks() {
            None
        } else if self.is_dataset_level {
            Some(RollbackLevel::Dataset)
        } else {
            Some(RollbackLevel::Row)
        }
    }
}
