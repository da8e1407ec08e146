//! Persistence layer: snapshot history, per-feed "latest" slots, and the
//! append-only rollback log.
//!
//! Provides the [`SnapshotStore`] trait. [`FileStore`] keeps everything as
//! JSON files under a data directory; [`MemoryStore`] keeps it in process
//! and backs the cycle tests.

pub mod file_store;
pub mod memory;

use std::future::Future;

use crate::domain::{ComparisonResult, FeedSource, Snapshot};
use crate::error::TrackerError;

pub use file_store::FileStore;
pub use memory::MemoryStore;

/// Durable storage used by the detection cycle and the dashboard.
///
/// The orchestrator receives a store handle explicitly; the detector never
/// sees one.
pub trait SnapshotStore {
    /// Stores `snapshot` in the history under a key derived from its source
    /// and timestamp, never overwriting an earlier entry. Returns the key.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Storage`] on write failure.
    fn save_snapshot(
        &self,
        snapshot: &Snapshot,
    ) -> impl Future<Output = Result<String, TrackerError>> + Send;

    /// Overwrites the latest slot for the snapshot's source.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Storage`] on write failure.
    fn save_latest(&self, snapshot: &Snapshot)
    -> impl Future<Output = Result<(), TrackerError>> + Send;

    /// Reads the latest slot for `source`, `None` if it was never written.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::CorruptState`] if the slot cannot be decoded
    /// and [`TrackerError::Storage`] on read failure.
    fn load_latest(
        &self,
        source: FeedSource,
    ) -> impl Future<Output = Result<Option<Snapshot>, TrackerError>> + Send;

    /// Appends `result` to the rollback log. Does nothing and returns
    /// `false` when the result has no rollbacks.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::CorruptState`] if the existing log cannot be
    /// decoded (it is never replaced in that case) and
    /// [`TrackerError::Storage`] on I/O failure.
    fn append_rollback_log(
        &self,
        result: &ComparisonResult,
    ) -> impl Future<Output = Result<bool, TrackerError>> + Send;

    /// Overwrites the latest comparison slot.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Storage`] on write failure.
    fn save_latest_comparison(
        &self,
        result: &ComparisonResult,
    ) -> impl Future<Output = Result<(), TrackerError>> + Send;

    /// Reads the latest comparison slot.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::CorruptState`] if the slot cannot be decoded
    /// and [`TrackerError::Storage`] on read failure.
    fn load_latest_comparison(
        &self,
    ) -> impl Future<Output = Result<Option<ComparisonResult>, TrackerError>> + Send;

    /// Reads the whole rollback log in append order; empty if nothing was
    /// ever appended.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::CorruptState`] if the log cannot be decoded
    /// and [`TrackerError::Storage`] on read failure.
    fn load_rollback_log(
        &self,
    ) -> impl Future<Output = Result<Vec<ComparisonResult>, TrackerError>> + Send;
}
