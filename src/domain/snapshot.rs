//! Point-in-time captures of a whole feed.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{FeedSource, OverflowRecord};

/// Immutable collection of records captured from one feed at one instant.
///
/// Record order carries no meaning for comparison; lookups go through
/// `location_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Snapshot {
    /// Capture instant (UTC).
    pub timestamp: DateTime<Utc>,
    /// Feed the snapshot was taken from.
    pub source: FeedSource,
    /// Records in the order the feed returned them.
    #[serde(default)]
    pub records: Vec<OverflowRecord>,
}

impl Snapshot {
    /// Creates a snapshot stamped with the current time.
    #[must_use]
    pub fn new(source: FeedSource, records: Vec<OverflowRecord>) -> Self {
        Self::with_timestamp(Utc::now(), source, records)
    }

    /// Creates a snapshot with an explicit capture instant.
    #[must_use]
    pub const fn with_timestamp(
        timestamp: DateTime<Utc>,
        source: FeedSource,
        records: Vec<OverflowRecord>,
    ) -> Self {
        Self {
            timestamp,
            source,
            records,
        }
    }

    /// Returns the record for `location_id`, if present.
    #[must_use]
    pub fn get_record_by_id(&self, location_id: &str) -> Option<&OverflowRecord> {
        self.records
            .iter()
            .find(|record| record.location_id == location_id)
    }

    /// Builds a lookup table keyed by location id.
    ///
    /// If a feed ever repeats an id, the first occurrence wins, matching
    /// [`Snapshot::get_record_by_id`].
    #[must_use]
    pub fn index_by_location(&self) -> HashMap<&str, &OverflowRecord> {
        let mut index = HashMap::with_capacity(self.records.len());
        for record in &self.records {
            index.entry(record.location_id.as_str()).or_insert(record);
        }
        index
    }

    /// Number of records in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the feed returned no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
