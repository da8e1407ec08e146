//! NSOH ArcGIS FeatureServer client (primary feed).
//!
//! The layer is queried page by page with `resultOffset` /
//! `resultRecordCount` until a page comes back empty or short.

use std::future::Future;

use chrono::Utc;
use serde::{Deserialize, Deserializer};

use super::{FeedFetcher, RetryPolicy, get_json, with_retry};
use crate::domain::{DischargeStatus, FeedSource, OverflowRecord, Snapshot};
use crate::error::TrackerError;

/// One page of an ArcGIS `query` response.
#[derive(Debug, Default, Deserialize)]
pub struct ArcGisPage {
    /// Features on this page.
    #[serde(default)]
    pub features: Vec<ArcGisFeature>,
    /// Error object ArcGIS returns with a `200 OK` status.
    #[serde(default)]
    pub error: Option<ArcGisError>,
}

/// A single feature; only its attributes are used.
#[derive(Debug, Default, Deserialize)]
pub struct ArcGisFeature {
    /// Attribute table row.
    #[serde(default)]
    pub attributes: NsohAttributes,
}

/// Error payload embedded in an ArcGIS response body.
#[derive(Debug, Default, Deserialize)]
pub struct ArcGisError {
    /// Service error code.
    #[serde(default)]
    pub code: Option<i64>,
    /// Service error message.
    #[serde(default)]
    pub message: Option<String>,
}

/// Storm overflow attributes published by the NSOH layer.
#[derive(Debug, Default, Deserialize)]
pub struct NsohAttributes {
    /// Location id; ArcGIS may hand it back as a string or a number.
    #[serde(rename = "Id", default)]
    pub id: Option<serde_json::Value>,
    /// Integer status code.
    #[serde(rename = "Status", default, deserialize_with = "lenient_millis")]
    pub status: Option<i64>,
    /// Status start, Unix milliseconds.
    #[serde(rename = "StatusStart", default, deserialize_with = "lenient_millis")]
    pub status_start: Option<i64>,
    /// Latest discharge start, Unix milliseconds.
    #[serde(rename = "LatestEventStart", default, deserialize_with = "lenient_millis")]
    pub latest_event_start: Option<i64>,
    /// Latest discharge end, Unix milliseconds.
    #[serde(rename = "LatestEventEnd", default, deserialize_with = "lenient_millis")]
    pub latest_event_end: Option<i64>,
    /// Last update, Unix milliseconds.
    #[serde(rename = "LastUpdated", default, deserialize_with = "lenient_millis")]
    pub last_updated: Option<i64>,
}

/// Accepts integers and floats (ArcGIS date fields occasionally come back
/// as `1.7e12`).
fn lenient_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let number = Option::<serde_json::Number>::deserialize(deserializer)?;
    #[allow(clippy::cast_possible_truncation)]
    let millis = number.and_then(|n| n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)));
    Ok(millis)
}

/// Converts one feature into a record, dropping features without an id.
#[must_use]
pub fn parse_feature(feature: ArcGisFeature) -> Option<OverflowRecord> {
    let attrs = feature.attributes;
    let location_id = match attrs.id? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if location_id.is_empty() {
        return None;
    }

    Some(OverflowRecord {
        location_id,
        status: DischargeStatus::from(attrs.status),
        status_start: attrs.status_start,
        latest_event_start: attrs.latest_event_start,
        latest_event_end: attrs.latest_event_end,
        last_updated: attrs.last_updated,
        source: FeedSource::Nsoh,
    })
}

/// Drains a paginated layer, calling `fetch_page` with each offset.
///
/// Stops at the first empty page or the first page shorter than
/// `page_size`.
///
/// # Errors
///
/// Propagates the first page error.
pub async fn collect_pages<F, Fut>(
    page_size: usize,
    mut fetch_page: F,
) -> Result<Vec<OverflowRecord>, TrackerError>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<ArcGisPage, TrackerError>>,
{
    let page_size = page_size.max(1);
    let mut records = Vec::new();
    let mut offset = 0;

    loop {
        let page = fetch_page(offset).await?;
        let returned = page.features.len();
        if returned == 0 {
            break;
        }

        records.extend(page.features.into_iter().filter_map(parse_feature));

        if returned < page_size {
            break;
        }
        offset += page_size;
    }

    Ok(records)
}

/// Primary feed fetcher.
#[derive(Debug, Clone)]
pub struct NsohFetcher {
    client: reqwest::Client,
    url: String,
    page_size: usize,
    retry: RetryPolicy,
}

impl NsohFetcher {
    /// Creates a fetcher for the given query endpoint.
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        url: impl Into<String>,
        page_size: usize,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            page_size,
            retry,
        }
    }

    /// Fetches one page, retrying per the policy.
    async fn fetch_page(&self, offset: usize) -> Result<ArcGisPage, TrackerError> {
        let offset = offset.to_string();
        let count = self.page_size.to_string();
        let query = [
            ("where", "1=1"),
            ("outFields", "*"),
            ("f", "json"),
            ("resultOffset", offset.as_str()),
            ("resultRecordCount", count.as_str()),
        ];

        with_retry(&self.retry, FeedSource::Nsoh, |attempt| {
            tracing::debug!(offset = %offset, attempt, "requesting nsoh page");
            let request = self.client.get(&self.url).query(&query);
            async move {
                let page: ArcGisPage = get_json(request, FeedSource::Nsoh).await?;
                match page.error {
                    Some(err) => Err(TrackerError::MalformedPayload {
                        feed: FeedSource::Nsoh,
                        message: format!(
                            "arcgis error {}: {}",
                            err.code.unwrap_or_default(),
                            err.message.unwrap_or_default()
                        ),
                    }),
                    None => Ok(page),
                }
            }
        })
        .await
    }
}

impl FeedFetcher for NsohFetcher {
    fn source(&self) -> FeedSource {
        FeedSource::Nsoh
    }

    async fn fetch(&self) -> Result<Snapshot, TrackerError> {
        let captured_at = Utc::now();
        let records = collect_pages(self.page_size, |offset| self.fetch_page(offset)).await?;
        tracing::info!(feed = "nsoh", records = records.len(), "feed fetched");
        Ok(Snapshot::with_timestamp(captured_at, FeedSource::Nsoh, records))
    }
}
