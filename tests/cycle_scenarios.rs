//! End-to-end detection cycles over stub feeds and an in-memory store.

#![allow(clippy::panic, clippy::indexing_slicing)]

mod common;

use common::{StubFetcher, nsoh, nsoh_snapshot, thames};
use nsoh_rollback_tracker::domain::{DischargeStatus, FeedSource, OverflowRecord, RollbackLevel};
use nsoh_rollback_tracker::error::TrackerError;
use nsoh_rollback_tracker::persistence::{FileStore, MemoryStore, SnapshotStore};
use nsoh_rollback_tracker::service::{CycleOutcome, CycleService};

fn service(
    primary: StubFetcher,
    secondary: StubFetcher,
    store: MemoryStore,
) -> CycleService<StubFetcher, StubFetcher, MemoryStore> {
    CycleService::new(primary, secondary, store)
}

#[tokio::test]
async fn single_regression_is_reported_with_context() {
    let previous = nsoh_snapshot(0, vec![nsoh("L1", Some(1000), Some(1000))]);
    let current = OverflowRecord::new("L1", DischargeStatus::Discharging, FeedSource::Nsoh)
        .with_status_start(Some(500))
        .with_last_updated(Some(1000));
    let svc = service(
        StubFetcher::ok(FeedSource::Nsoh, vec![current]),
        StubFetcher::ok(FeedSource::Thames, vec![thames("L1", Some(900))]),
        MemoryStore::with_latest([previous]),
    );

    let Ok(outcome) = svc.run_cycle().await else {
        panic!("cycle failed");
    };
    let CycleOutcome::RollbackDetected(result) = &outcome else {
        panic!("expected a rollback, got {outcome:?}");
    };
    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(outcome.level(), Some(RollbackLevel::Dataset));
    assert_eq!(result.total_locations, 1);
    assert_eq!(result.rollbacks_detected, 1);
    assert!((result.rollback_percentage - 100.0).abs() < f64::EPSILON);

    let event = &result.rollback_events[0];
    assert_eq!(event.location_id, "L1");
    assert_eq!(event.previous_status_start, Some(1000));
    assert_eq!(event.current_status_start, Some(500));
    assert_eq!(event.thames_status_start, Some(900));
    assert!(event.status_changed);

    let Ok(log) = svc.store().load_rollback_log().await else {
        panic!("log unreadable");
    };
    assert_eq!(log, vec![result.clone()]);
}

#[tokio::test]
async fn new_location_and_unchanged_row_produce_no_events() {
    let previous = nsoh_snapshot(0, vec![nsoh("L1", Some(1000), Some(2000))]);
    let svc = service(
        StubFetcher::ok(
            FeedSource::Nsoh,
            vec![nsoh("L1", Some(1000), Some(2000)), nsoh("L2", Some(10), Some(10))],
        ),
        StubFetcher::ok(FeedSource::Thames, Vec::new()),
        MemoryStore::with_latest([previous]),
    );

    let Ok(outcome) = svc.run_cycle().await else {
        panic!("cycle failed");
    };
    let CycleOutcome::NoRollback(result) = &outcome else {
        panic!("expected no rollback, got {outcome:?}");
    };
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(result.total_locations, 2);
    assert_eq!(result.rollbacks_detected, 0);
    assert!(result.rollback_events.is_empty());

    let store = svc.store();
    let Ok(log) = store.load_rollback_log().await else {
        panic!("log unreadable");
    };
    assert!(log.is_empty());
    let Ok(Some(latest)) = store.load_latest_comparison().await else {
        panic!("latest comparison missing");
    };
    assert_eq!(&latest, result);
}

#[tokio::test]
async fn majority_regression_is_dataset_level() {
    let previous = nsoh_snapshot(
        0,
        vec![
            nsoh("L1", Some(100), Some(100)),
            nsoh("L2", Some(100), Some(100)),
            nsoh("L3", Some(100), Some(100)),
            nsoh("L4", Some(100), Some(100)),
        ],
    );
    let svc = service(
        StubFetcher::ok(
            FeedSource::Nsoh,
            vec![
                nsoh("L1", Some(50), Some(100)),
                nsoh("L2", Some(100), Some(50)),
                nsoh("L3", Some(50), Some(50)),
                nsoh("L4", Some(200), Some(200)),
            ],
        ),
        StubFetcher::ok(FeedSource::Thames, Vec::new()),
        MemoryStore::with_latest([previous]),
    );

    let Ok(CycleOutcome::RollbackDetected(result)) = svc.run_cycle().await else {
        panic!("expected a rollback");
    };
    assert_eq!(result.rollbacks_detected, 3);
    assert!((result.rollback_percentage - 75.0).abs() < f64::EPSILON);
    assert!(result.is_dataset_level);
    assert!(result.rollback_events.iter().all(|e| e.thames_status_start.is_none()));
}

#[tokio::test]
async fn exactly_half_is_row_level() {
    let previous = nsoh_snapshot(
        0,
        vec![nsoh("L1", Some(100), None), nsoh("L2", Some(100), None)],
    );
    let svc = service(
        StubFetcher::ok(
            FeedSource::Nsoh,
            vec![nsoh("L1", Some(99), None), nsoh("L2", Some(100), None)],
        ),
        StubFetcher::ok(FeedSource::Thames, Vec::new()),
        MemoryStore::with_latest([previous]),
    );

    let Ok(outcome) = svc.run_cycle().await else {
        panic!("cycle failed");
    };
    assert_eq!(outcome.level(), Some(RollbackLevel::Row));
    assert_eq!(outcome.exit_code(), 1);
}

#[tokio::test]
async fn first_run_saves_baseline_only() {
    let svc = service(
        StubFetcher::ok(FeedSource::Nsoh, vec![nsoh("L1", Some(1), Some(1))]),
        StubFetcher::ok(FeedSource::Thames, vec![thames("T1", Some(1))]),
        MemoryStore::new(),
    );

    let Ok(outcome) = svc.run_cycle().await else {
        panic!("cycle failed");
    };
    assert_eq!(
        outcome,
        CycleOutcome::Baseline {
            primary_records: 1,
            secondary_records: 1,
        }
    );
    assert_eq!(outcome.exit_code(), 0);
    assert!(outcome.comparison().is_none());

    let store = svc.store();
    let history = store.history().await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].1.source, FeedSource::Thames);
    assert_eq!(history[1].1.source, FeedSource::Nsoh);

    for source in FeedSource::ALL {
        let Ok(Some(latest)) = store.load_latest(source).await else {
            panic!("latest {source} missing");
        };
        assert_eq!(latest.len(), 1);
    }
    let Ok(comparison) = store.load_latest_comparison().await else {
        panic!("comparison unreadable");
    };
    assert!(comparison.is_none());
    let Ok(log) = store.load_rollback_log().await else {
        panic!("log unreadable");
    };
    assert!(log.is_empty());
}

#[tokio::test]
async fn second_run_compares_against_baseline() {
    let svc = service(
        StubFetcher::ok(FeedSource::Nsoh, vec![nsoh("L1", Some(5), Some(5))]),
        StubFetcher::ok(FeedSource::Thames, Vec::new()),
        MemoryStore::new(),
    );

    let Ok(first) = svc.run_cycle().await else {
        panic!("first cycle failed");
    };
    assert!(matches!(first, CycleOutcome::Baseline { .. }));

    let Ok(second) = svc.run_cycle().await else {
        panic!("second cycle failed");
    };
    let CycleOutcome::NoRollback(result) = second else {
        panic!("identical feeds must not roll back");
    };
    assert_eq!(result.total_locations, 1);
    assert_eq!(svc.store().history().await.len(), 4);
}

#[tokio::test]
async fn fetch_failure_leaves_state_untouched() {
    let previous = nsoh_snapshot(0, vec![nsoh("L1", Some(1000), Some(1000))]);
    let svc = service(
        StubFetcher::ok(FeedSource::Nsoh, vec![nsoh("L1", Some(1), Some(1))]),
        StubFetcher::failing(FeedSource::Thames, "connection reset"),
        MemoryStore::with_latest([previous.clone()]),
    );

    let Err(err) = svc.run_cycle().await else {
        panic!("a failed fetch must fail the cycle");
    };
    assert!(matches!(err, TrackerError::Transport { feed: FeedSource::Thames, .. }));
    assert_eq!(err.exit_code(), 2);

    let store = svc.store();
    assert!(store.history().await.is_empty());
    let Ok(Some(latest)) = store.load_latest(FeedSource::Nsoh).await else {
        panic!("baseline lost");
    };
    assert_eq!(latest, previous);
    let Ok(comparison) = store.load_latest_comparison().await else {
        panic!("comparison unreadable");
    };
    assert!(comparison.is_none());
}

#[tokio::test]
async fn corrupt_baseline_fails_without_overwrite() {
    let Ok(dir) = tempfile::tempdir() else {
        panic!("tempdir");
    };
    let store = FileStore::new(dir.path());
    let path = store.latest_path(FeedSource::Nsoh);
    let Some(parent) = path.parent() else {
        panic!("latest path has no parent");
    };
    let Ok(()) = std::fs::create_dir_all(parent) else {
        panic!("mkdir");
    };
    let Ok(()) = std::fs::write(&path, b"{not json") else {
        panic!("write");
    };

    let svc = CycleService::new(
        StubFetcher::ok(FeedSource::Nsoh, vec![nsoh("L1", Some(1), Some(1))]),
        StubFetcher::ok(FeedSource::Thames, Vec::new()),
        store,
    );
    let Err(err) = svc.run_cycle().await else {
        panic!("a corrupt baseline must fail the cycle");
    };
    assert!(matches!(err, TrackerError::CorruptState { .. }));
    assert_eq!(err.exit_code(), 3);

    let Ok(contents) = std::fs::read(&path) else {
        panic!("read");
    };
    assert_eq!(contents, b"{not json");
    assert!(!dir.path().join("snapshots").exists());
}
