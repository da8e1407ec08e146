//! Property checks for rollback detection and classification.

#![allow(clippy::panic, clippy::indexing_slicing)]

mod common;

use proptest::prelude::*;

use common::{StubFetcher, base_time, nsoh, nsoh_snapshot};
use nsoh_rollback_tracker::detection::{
    DATASET_LEVEL_THRESHOLD_PERCENT, detect_rollbacks_at, rollback_percentage,
};
use nsoh_rollback_tracker::domain::{FeedSource, OverflowRecord};
use nsoh_rollback_tracker::persistence::MemoryStore;
use nsoh_rollback_tracker::service::{CycleOutcome, CycleService};

/// Previous timestamps plus a signed shift applied to each one.
#[derive(Debug, Clone)]
struct Row {
    status_start: Option<i64>,
    last_updated: Option<i64>,
    start_shift: i64,
    updated_shift: i64,
}

fn row_strategy() -> impl Strategy<Value = Row> {
    (
        prop::option::of(0i64..2_000_000_000_000),
        prop::option::of(0i64..2_000_000_000_000),
        -5i64..5,
        -5i64..5,
    )
        .prop_map(|(status_start, last_updated, start_shift, updated_shift)| Row {
            status_start,
            last_updated,
            start_shift,
            updated_shift,
        })
}

fn previous_records(rows: &[Row]) -> Vec<OverflowRecord> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| nsoh(&format!("L{i}"), row.status_start, row.last_updated))
        .collect()
}

fn current_records(rows: &[Row]) -> Vec<OverflowRecord> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            nsoh(
                &format!("L{i}"),
                row.status_start.map(|v| v + row.start_shift),
                row.last_updated.map(|v| v + row.updated_shift),
            )
        })
        .collect()
}

fn expected_regression(row: &Row) -> bool {
    (row.status_start.is_some() && row.start_shift < 0)
        || (row.last_updated.is_some() && row.updated_shift < 0)
}

proptest! {
    #[test]
    fn events_match_strict_regressions(rows in prop::collection::vec(row_strategy(), 0..60)) {
        let previous = nsoh_snapshot(0, previous_records(&rows));
        let current = nsoh_snapshot(5, current_records(&rows));
        let result = detect_rollbacks_at(&previous, &current, None, base_time());

        let expected: Vec<String> = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| expected_regression(row))
            .map(|(i, _)| format!("L{i}"))
            .collect();
        let detected: Vec<String> = result
            .rollback_events
            .iter()
            .map(|event| event.location_id.clone())
            .collect();

        prop_assert_eq!(detected, expected);
        prop_assert_eq!(result.rollbacks_detected, result.rollback_events.len());
        prop_assert_eq!(result.total_locations, rows.len());
        prop_assert!(result.rollback_events.iter().all(|e| e.detected_at == result.timestamp));
    }

    #[test]
    fn identical_snapshots_never_roll_back(rows in prop::collection::vec(row_strategy(), 0..60)) {
        let records = previous_records(&rows);
        let previous = nsoh_snapshot(0, records.clone());
        let current = nsoh_snapshot(5, records);
        let result = detect_rollbacks_at(&previous, &current, None, base_time());

        prop_assert_eq!(result.rollbacks_detected, 0);
        prop_assert!(!result.is_dataset_level);
        prop_assert!(result.rollback_percentage.abs() < f64::EPSILON);
    }

    #[test]
    fn new_locations_are_counted_but_never_flagged(
        rows in prop::collection::vec(row_strategy(), 1..40),
        extra in 1usize..20,
    ) {
        let previous = nsoh_snapshot(0, Vec::new());
        let mut records = current_records(&rows);
        records.extend((0..extra).map(|i| nsoh(&format!("N{i}"), Some(0), Some(0))));
        let current = nsoh_snapshot(5, records);
        let result = detect_rollbacks_at(&previous, &current, None, base_time());

        prop_assert_eq!(result.rollbacks_detected, 0);
        prop_assert_eq!(result.total_locations, rows.len() + extra);
    }

    #[test]
    fn percentage_and_level_agree(rollbacks in 0usize..500, spare in 0usize..500) {
        let total = rollbacks + spare;
        let pct = rollback_percentage(rollbacks, total);
        if total == 0 {
            prop_assert!(pct.abs() < f64::EPSILON);
        } else {
            let exact = rollbacks as f64 * 100.0 / total as f64;
            prop_assert!((pct - exact).abs() <= 0.005 + 1e-9);
            prop_assert!((pct * 100.0 - (pct * 100.0).round()).abs() < 1e-6);
        }
        prop_assert!((0.0..=100.0).contains(&pct));

        let previous = nsoh_snapshot(
            0,
            (0..total).map(|i| nsoh(&format!("L{i}"), Some(10), None)).collect(),
        );
        let current = nsoh_snapshot(
            5,
            (0..total)
                .map(|i| nsoh(&format!("L{i}"), Some(if i < rollbacks { 9 } else { 10 }), None))
                .collect(),
        );
        let result = detect_rollbacks_at(&previous, &current, None, base_time());
        prop_assert_eq!(result.rollbacks_detected, rollbacks);
        prop_assert_eq!(
            result.is_dataset_level,
            result.rollback_percentage > DATASET_LEVEL_THRESHOLD_PERCENT
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn repeated_cycles_over_a_static_feed_stay_clean(
        rows in prop::collection::vec(row_strategy(), 0..20),
    ) {
        let records = previous_records(&rows);
        let svc = CycleService::new(
            StubFetcher::ok(FeedSource::Nsoh, records),
            StubFetcher::ok(FeedSource::Thames, Vec::new()),
            MemoryStore::new(),
        );

        let outcomes = tokio_test::block_on(async {
            let first = svc.run_cycle().await;
            let second = svc.run_cycle().await;
            (first, second)
        });
        let (Ok(first), Ok(second)) = outcomes else {
            panic!("cycle failed");
        };
        let is_baseline = matches!(first, CycleOutcome::Baseline { .. });
        prop_assert!(is_baseline);
        prop_assert_eq!(second.exit_code(), 0);
        prop_assert_eq!(second.comparison().map(|r| r.total_locations), Some(rows.len()));
    }
}
