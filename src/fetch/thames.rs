//! Thames Water open data client (secondary feed).

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use super::{FeedFetcher, RetryPolicy, get_json, with_retry};
use crate::domain::{DischargeStatus, FeedSource, OverflowRecord, Snapshot};
use crate::error::TrackerError;

/// Body of the discharge status endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ThamesResponse {
    /// One item per monitored overflow.
    #[serde(default)]
    pub items: Vec<ThamesItem>,
}

/// One overflow as published by Thames Water.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThamesItem {
    /// Permit-level identifier shared with NSOH.
    #[serde(default)]
    pub unique_id: Option<String>,
    /// `"Discharging"`, `"Not discharging"` or `"Offline"`.
    #[serde(default)]
    pub alert_status: Option<String>,
    /// ISO-8601 instant of the last status change.
    #[serde(default)]
    pub status_changed: Option<String>,
    /// ISO-8601 start of the most recent discharge.
    #[serde(default)]
    pub most_recent_discharge_alert_start: Option<String>,
    /// ISO-8601 end of the most recent discharge.
    #[serde(default)]
    pub most_recent_discharge_alert_stop: Option<String>,
}

/// Converts an ISO-8601 string to Unix milliseconds.
///
/// Strings without an offset are read as UTC. Empty or unparseable input
/// yields `None`.
#[must_use]
pub fn parse_iso_millis(value: Option<&str>) -> Option<i64> {
    let raw = value.map(str::trim).filter(|s| !s.is_empty())?;
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.timestamp_millis());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc().timestamp_millis())
}

/// Converts one item into a record, dropping items without an id.
///
/// Thames Water publishes no separate "last updated" field, so
/// `statusChanged` feeds both `status_start` and `last_updated`.
#[must_use]
pub fn parse_item(item: ThamesItem) -> Option<OverflowRecord> {
    let location_id = item.unique_id.filter(|id| !id.is_empty())?;
    let status_changed = parse_iso_millis(item.status_changed.as_deref());

    Some(OverflowRecord {
        location_id,
        status: item
            .alert_status
            .as_deref()
            .map_or(DischargeStatus::Offline, DischargeStatus::from_label),
        status_start: status_changed,
        latest_event_start: parse_iso_millis(item.most_recent_discharge_alert_start.as_deref()),
        latest_event_end: parse_iso_millis(item.most_recent_discharge_alert_stop.as_deref()),
        last_updated: status_changed,
        source: FeedSource::Thames,
    })
}

/// Secondary feed fetcher.
#[derive(Debug, Clone)]
pub struct ThamesFetcher {
    client: reqwest::Client,
    url: String,
    retry: RetryPolicy,
}

impl ThamesFetcher {
    /// Creates a fetcher for the given endpoint.
    #[must_use]
    pub fn new(client: reqwest::Client, url: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            client,
            url: url.into(),
            retry,
        }
    }
}

impl FeedFetcher for ThamesFetcher {
    fn source(&self) -> FeedSource {
        FeedSource::Thames
    }

    async fn fetch(&self) -> Result<Snapshot, TrackerError> {
        let captured_at = Utc::now();
        let response: ThamesResponse = with_retry(&self.retry, FeedSource::Thames, |attempt| {
            tracing::debug!(attempt, "requesting thames discharge status");
            get_json(self.client.get(&self.url), FeedSource::Thames)
        })
        .await?;

        let records: Vec<OverflowRecord> =
            response.items.into_iter().filter_map(parse_item).collect();
        tracing::info!(feed = "thames", records = records.len(), "feed fetched");
        Ok(Snapshot::with_timestamp(captured_at, FeedSource::Thames, records))
    }
}
