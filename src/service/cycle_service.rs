//! Detection cycle: fetch → load previous → detect → persist.

use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::detection::detect_rollbacks;
use crate::domain::{ComparisonResult, FeedSource, RollbackLevel, Snapshot};
use crate::error::TrackerError;
use crate::fetch::FeedFetcher;
use crate::persistence::SnapshotStore;

/// How a successful cycle ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CycleOutcome {
    /// No previous primary snapshot existed; the fresh snapshots were
    /// stored as the baseline and nothing was compared.
    Baseline {
        /// Records in the primary snapshot.
        primary_records: usize,
        /// Records in the secondary snapshot.
        secondary_records: usize,
    },
    /// Compared against the baseline and found nothing.
    NoRollback(ComparisonResult),
    /// At least one location rolled back.
    RollbackDetected(ComparisonResult),
}

impl CycleOutcome {
    /// The comparison produced this cycle, if any.
    #[must_use]
    pub const fn comparison(&self) -> Option<&ComparisonResult> {
        match self {
            Self::Baseline { .. } => None,
            Self::NoRollback(result) | Self::RollbackDetected(result) => Some(result),
        }
    }

    /// Severity when rollbacks were found.
    #[must_use]
    pub const fn level(&self) -> Option<RollbackLevel> {
        match self {
            Self::RollbackDetected(result) => result.level(),
            Self::Baseline { .. } | Self::NoRollback(_) => None,
        }
    }

    /// Process exit status: `0` when clean, `1` when rollbacks were found.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Baseline { .. } | Self::NoRollback(_) => 0,
            Self::RollbackDetected(_) => 1,
        }
    }
}

/// Orchestrates one detection cycle.
///
/// Owns the two fetchers and an explicit store handle. Fetch errors abort
/// ahead of any load or save. Rollbacks are logged before the latest
/// primary snapshot is replaced, so a failed append keeps the old baseline.
#[derive(Debug)]
pub struct CycleService<P, S, St> {
    primary: P,
    secondary: S,
    store: St,
}

impl<P, S, St> CycleService<P, S, St>
where
    P: FeedFetcher,
    S: FeedFetcher,
    St: SnapshotStore,
{
    /// Creates a new `CycleService`.
    #[must_use]
    pub const fn new(primary: P, secondary: S, store: St) -> Self {
        Self {
            primary,
            secondary,
            store,
        }
    }

    /// Returns a reference to the inner store.
    #[must_use]
    pub const fn store(&self) -> &St {
        &self.store
    }

    /// Runs one cycle inside a `cycle` span tagged with a fresh `run_id`.
    ///
    /// # Errors
    ///
    /// Returns a fetch error if either feed fails, or a storage error if
    /// the previous state cannot be read or the new state cannot be saved.
    pub async fn run_cycle(&self) -> Result<CycleOutcome, TrackerError> {
        let run_id = Uuid::new_v4();
        self.cycle()
            .instrument(tracing::info_span!("cycle", %run_id))
            .await
    }

    async fn cycle(&self) -> Result<CycleOutcome, TrackerError> {
        tracing::info!("starting rollback detection cycle");

        let (secondary, primary) = tokio::try_join!(self.secondary.fetch(), self.primary.fetch())?;
        tracing::info!(
            primary = %self.primary.source(),
            primary_records = primary.len(),
            secondary = %self.secondary.source(),
            secondary_records = secondary.len(),
            "feeds fetched"
        );

        let Some(previous) = self.store.load_latest(FeedSource::Nsoh).await? else {
            tracing::info!("no previous primary snapshot, saving baseline");
            self.persist_snapshots(&secondary, &primary).await?;
            return Ok(CycleOutcome::Baseline {
                primary_records: primary.len(),
                secondary_records: secondary.len(),
            });
        };

        tracing::info!(previous = %previous.timestamp, "comparing snapshots");
        let result = detect_rollbacks(&previous, &primary, Some(&secondary));

        // Append before the baseline moves.
        if result.has_rollbacks() {
            self.store.append_rollback_log(&result).await?;
        }
        self.persist_snapshots(&secondary, &primary).await?;
        self.store.save_latest_comparison(&result).await?;

        if !result.has_rollbacks() {
            tracing::info!(total_locations = result.total_locations, "no rollbacks detected");
            return Ok(CycleOutcome::NoRollback(result));
        }

        tracing::warn!(
            level = %result.level().unwrap_or(RollbackLevel::Row),
            rollbacks_detected = result.rollbacks_detected,
            total_locations = result.total_locations,
            rollback_percentage = result.rollback_percentage,
            detected_at = %result.timestamp,
            "rollback detected"
        );
        Ok(CycleOutcome::RollbackDetected(result))
    }

    /// Writes both snapshots to history and to their latest slots.
    async fn persist_snapshots(
        &self,
        secondary: &Snapshot,
        primary: &Snapshot,
    ) -> Result<(), TrackerError> {
        for snapshot in [secondary, primary] {
            let key = self.store.save_snapshot(snapshot).await?;
            tracing::debug!(source = %snapshot.source, %key, "snapshot stored");
        }
        for snapshot in [secondary, primary] {
            self.store.save_latest(snapshot).await?;
        }
        Ok(())
    }
}
