//! Rolls per-location events into a cycle verdict.

use chrono::{DateTime, Utc};

use crate::domain::{ComparisonResult, RollbackEvent};

/// Share of affected locations above which a cycle counts as a
/// dataset-level rollback. Exactly this value is still row-level.
pub const DATASET_LEVEL_THRESHOLD_PERCENT: f64 = 50.0;

/// Builds the [`ComparisonResult`] for one cycle.
///
/// `total_locations` is the size of the current primary snapshot. Event
/// order is kept as given.
#[must_use]
pub fn aggregate(
    total_locations: usize,
    rollback_events: Vec<RollbackEvent>,
    timestamp: DateTime<Utc>,
) -> ComparisonResult {
    let rollbacks_detected = rollback_events.len();
    let rollback_percentage = rollback_percentage(rollbacks_detected, total_locations);

    ComparisonResult {
        timestamp,
        total_locations,
        rollbacks_detected,
        rollback_percentage,
        is_dataset_level: is_dataset_level(rollback_percentage),
        rollback_events,
    }
}

/// `100 * rollbacks / total` rounded to two decimals; `0.0` for an empty
/// snapshot.
#[must_use]
pub fn rollback_percentage(rollbacks: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let raw = rollbacks as f64 / total as f64 * 100.0;
    round2(raw)
}

/// Strictly above [`DATASET_LEVEL_THRESHOLD_PERCENT`].
#[must_use]
pub fn is_dataset_level(rollback_percentage: f64) -> bool {
    rollback_percentage > DATASET_LEVEL_THRESHOLD_PERCENT
}

/// Rounds to the nearest two-decimal value of the exact binary `value`,
/// ties to even. Scaling by 100 first would round `3.125` up.
fn round2(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}
