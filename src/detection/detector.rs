//! Pairwise record comparison.
//!
//! A location rolls back when either its `status_start` or its
//! `last_updated` is strictly earlier than in the previous primary
//! snapshot. An axis where either side is missing cannot trigger.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::aggregator::aggregate;
use crate::domain::{ComparisonResult, OverflowRecord, RollbackEvent, Snapshot};

/// Compares one location across two primary snapshots.
///
/// Returns `None` unless at least one of the two timestamps regressed.
/// `secondary` is the secondary feed's record for the same location and
/// is only copied into the event for context.
#[must_use]
pub fn detect_record_rollback(
    previous: &OverflowRecord,
    current: &OverflowRecord,
    secondary: Option<&OverflowRecord>,
    detected_at: DateTime<Utc>,
) -> Option<RollbackEvent> {
    let status_start_regressed = regressed(previous.status_start, current.status_start);
    let last_updated_regressed = regressed(previous.last_updated, current.last_updated);

    if !(status_start_regressed || last_updated_regressed) {
        return None;
    }

    Some(RollbackEvent {
        location_id: current.location_id.clone(),
        detected_at,
        previous_status_start: previous.status_start,
        current_status_start: current.status_start,
        previous_last_updated: previous.last_updated,
        current_last_updated: current.last_updated,
        thames_status_start: secondary.and_then(|record| record.status_start),
        status_changed: previous.status != current.status,
    })
}

/// Compares two primary snapshots, reading the clock once for the whole
/// cycle.
#[must_use]
pub fn detect_rollbacks(
    previous: &Snapshot,
    current: &Snapshot,
    secondary: Option<&Snapshot>,
) -> ComparisonResult {
    detect_rollbacks_at(previous, current, secondary, Utc::now())
}

/// Compares two primary snapshots at a fixed detection instant.
///
/// Locations absent from `previous` are new and never produce an event,
/// but they still count towards `total_locations`.
#[must_use]
pub fn detect_rollbacks_at(
    previous: &Snapshot,
    current: &Snapshot,
    secondary: Option<&Snapshot>,
    detected_at: DateTime<Utc>,
) -> ComparisonResult {
    let previous_by_id = previous.index_by_location();
    let secondary_by_id = secondary.map(Snapshot::index_by_location).unwrap_or_default();

    let events = current
        .records
        .iter()
        .filter_map(|record| {
            let id = record.location_id.as_str();
            let prior = previous_by_id.get(id)?;
            detect_record_rollback(prior, record, lookup(&secondary_by_id, id), detected_at)
        })
        .collect::<Vec<_>>();

    if !events.is_empty() {
        tracing::debug!(
            rollbacks = events.len(),
            total = current.records.len(),
            "location regressions found"
        );
    }

    aggregate(current.records.len(), events, detected_at)
}

fn lookup<'a>(index: &HashMap<&str, &'a OverflowRecord>, id: &str) -> Option<&'a OverflowRecord> {
    index.get(id).copied()
}

/// Strictly-earlier check with no tolerance window.
const fn regressed(previous: Option<i64>, current: Option<i64>) -> bool {
    match (previous, current) {
        (Some(prev), Some(curr)) => curr < prev,
        _ => false,
    }
}
