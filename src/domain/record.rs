//! Per-location overflow status records.
//!
//! [`OverflowRecord`] is the unit of comparison between two snapshots. All
//! timestamps are Unix milliseconds and optional, since neither feed
//! guarantees every field for every location.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Feed that produced a record or snapshot.
///
/// Serialized as the lowercase feed name so persisted files keep their
/// historical layout (`"nsoh"`, `"thames"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FeedSource {
    /// National Storm Overflow Hub: the regulator-facing primary feed and
    /// the only feed checked for rollbacks.
    Nsoh,
    /// Thames Water open data: the utility-facing secondary feed, used as
    /// context only.
    Thames,
}

impl FeedSource {
    /// Both feeds, primary first.
    pub const ALL: [Self; 2] = [Self::Nsoh, Self::Thames];

    /// Returns the persisted name of the feed.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Nsoh => "nsoh",
            Self::Thames => "thames",
        }
    }

    /// Returns `true` for the feed whose regressions are detected.
    #[must_use]
    pub const fn is_primary(&self) -> bool {
        matches!(self, Self::Nsoh)
    }
}

impl fmt::Display for FeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nsoh" => Ok(Self::Nsoh),
            "thames" => Ok(Self::Thames),
            other => Err(format!("unknown feed source: {other}")),
        }
    }
}

/// Operational state of an overflow location.
///
/// Persisted as a small signed integer: `1` discharging, `0` not
/// discharging, `-1` offline. Anything unrecognised (including `null`)
/// reads back as [`DischargeStatus::Offline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i8", from = "Option<i64>")]
pub enum DischargeStatus {
    /// Overflow is currently discharging.
    Discharging,
    /// Overflow is monitored and not discharging.
    NotDischarging,
    /// Monitor offline or status unknown.
    Offline,
}

impl DischargeStatus {
    /// Returns the integer code used on the wire and on disk.
    #[must_use]
    pub const fn code(&self) -> i8 {
        match self {
            Self::Discharging => 1,
            Self::NotDischarging => 0,
            Self::Offline => -1,
        }
    }

    /// Maps an integer status code. Unknown codes are treated as offline.
    #[must_use]
    pub const fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Discharging,
            0 => Self::NotDischarging,
            _ => Self::Offline,
        }
    }

    /// Maps a Thames Water `alertStatus` label. Unknown labels are
    /// treated as offline.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label {
            "Discharging" => Self::Discharging,
            "Not discharging" => Self::NotDischarging,
            _ => Self::Offline,
        }
    }
}

impl From<DischargeStatus> for i8 {
    fn from(status: DischargeStatus) -> Self {
        status.code()
    }
}

impl From<Option<i64>> for DischargeStatus {
    fn from(code: Option<i64>) -> Self {
        code.map_or(Self::Offline, Self::from_code)
    }
}

/// One location's status at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OverflowRecord {
    /// Stable location identifier, unique within a snapshot.
    pub location_id: String,
    /// Current discharge status.
    #[schema(value_type = i8)]
    pub status: DischargeStatus,
    /// When the current status began.
    #[serde(default)]
    pub status_start: Option<i64>,
    /// Start of the most recent discharge event.
    #[serde(default)]
    pub latest_event_start: Option<i64>,
    /// End of the most recent discharge event.
    #[serde(default)]
    pub latest_event_end: Option<i64>,
    /// When the source last touched this record.
    #[serde(default)]
    pub last_updated: Option<i64>,
    /// Feed the record came from.
    pub source: FeedSource,
}

impl OverflowRecord {
    /// Creates a record with every timestamp absent.
    #[must_use]
    pub fn new(location_id: impl Into<String>, status: DischargeStatus, source: FeedSource) -> Self {
        Self {
            location_id: location_id.into(),
            status,
            status_start: None,
            latest_event_start: None,
            latest_event_end: None,
            last_updated: None,
            source,
        }
    }

    /// Sets `status_start`.
    #[must_use]
    pub fn with_status_start(mut self, millis: Option<i64>) -> Self {
        self.status_start = millis;
        self
    }

    /// Sets `last_updated`.
    #[must_use]
    pub fn with_last_updated(mut self, millis: Option<i64>) -> Self {
        self.last_updated = millis;
        self
    }

    /// Sets the latest discharge event window.
    #[must_use]
    pub fn with_latest_event(mut self, start: Option<i64>, end: Option<i64>) -> Self {
        self.latest_event_start = start;
        self.latest_event_end = end;
        self
    }
}
