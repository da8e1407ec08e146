//! Shared fixtures for integration tests.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};

use nsoh_rollback_tracker::domain::{DischargeStatus, FeedSource, OverflowRecord, Snapshot};
use nsoh_rollback_tracker::error::TrackerError;
use nsoh_rollback_tracker::fetch::FeedFetcher;

/// Fetcher returning canned records or a transport failure.
#[derive(Debug, Clone)]
pub struct StubFetcher {
    source: FeedSource,
    response: Result<Vec<OverflowRecord>, String>,
}

impl StubFetcher {
    pub fn ok(source: FeedSource, records: Vec<OverflowRecord>) -> Self {
        Self {
            source,
            response: Ok(records),
        }
    }

    pub fn failing(source: FeedSource, message: &str) -> Self {
        Self {
            source,
            response: Err(message.to_string()),
        }
    }
}

impl FeedFetcher for StubFetcher {
    fn source(&self) -> FeedSource {
        self.source
    }

    async fn fetch(&self) -> Result<Snapshot, TrackerError> {
        match &self.response {
            Ok(records) => Ok(Snapshot::new(self.source, records.clone())),
            Err(message) => Err(TrackerError::Transport {
                feed: self.source,
                message: message.clone(),
            }),
        }
    }
}

pub fn nsoh(id: &str, status_start: Option<i64>, last_updated: Option<i64>) -> OverflowRecord {
    OverflowRecord::new(id, DischargeStatus::NotDischarging, FeedSource::Nsoh)
        .with_status_start(status_start)
        .with_last_updated(last_updated)
}

pub fn thames(id: &str, status_start: Option<i64>) -> OverflowRecord {
    OverflowRecord::new(id, DischargeStatus::NotDischarging, FeedSource::Thames)
        .with_status_start(status_start)
        .with_last_updated(status_start)
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Primary snapshot captured `minutes` after [`base_time`].
pub fn nsoh_snapshot(minutes: i64, records: Vec<OverflowRecord>) -> Snapshot {
    Snapshot::with_timestamp(
        base_time() + Duration::minutes(minutes),
        FeedSource::Nsoh,
        records,
    )
}
