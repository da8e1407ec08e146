//! In-process implementation of the persistence layer.

use std::collections::HashMap;

use tokio::sync::RwLock;

use super::SnapshotStore;
use crate::domain::{ComparisonResult, FeedSource, Snapshot};
use crate::error::TrackerError;

#[derive(Debug, Default)]
struct MemoryState {
    history: Vec<(String, Snapshot)>,
    latest: HashMap<FeedSource, Snapshot>,
    rollback_log: Vec<ComparisonResult>,
    latest_comparison: Option<ComparisonResult>,
}

/// [`SnapshotStore`] held entirely in memory.
///
/// Shares the semantics of [`super::FileStore`]: history keys are never
/// reused and the rollback log only grows.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose latest slots already hold `snapshots`.
    #[must_use]
    pub fn with_latest(snapshots: impl IntoIterator<Item = Snapshot>) -> Self {
        let latest = snapshots
            .into_iter()
            .map(|snapshot| (snapshot.source, snapshot))
            .collect();
        Self {
            state: RwLock::new(MemoryState {
                latest,
                ..MemoryState::default()
            }),
        }
    }

    /// Returns the history as `(key, snapshot)` pairs in save order.
    pub async fn history(&self) -> Vec<(String, Snapshot)> {
        self.state.read().await.history.clone()
    }
}

impl SnapshotStore for MemoryStore {
    async fn save_snapshot(&self, snapshot: &Snapshot) -> Result<String, TrackerError> {
        let mut state = self.state.write().await;
        let base = format!(
            "{}/{}",
            snapshot.source.as_str(),
            snapshot.timestamp.to_rfc3339()
        );
        let mut key = base.clone();
        let mut suffix = 0_u32;
        while state.history.iter().any(|(existing, _)| *existing == key) {
            suffix += 1;
            key = format!("{base}_{suffix}");
        }
        state.history.push((key.clone(), snapshot.clone()));
        Ok(key)
    }

    async fn save_latest(&self, snapshot: &Snapshot) -> Result<(), TrackerError> {
        self.state
            .write()
            .await
            .latest
            .insert(snapshot.source, snapshot.clone());
        Ok(())
    }

    async fn load_latest(&self, source: FeedSource) -> Result<Option<Snapshot>, TrackerError> {
        Ok(self.state.read().await.latest.get(&source).cloned())
    }

    async fn append_rollback_log(&self, result: &ComparisonResult) -> Result<bool, TrackerError> {
        if !result.has_rollbacks() {
            return Ok(false);
        }
        self.state.write().await.rollback_log.push(result.clone());
        Ok(true)
    }

    async fn save_latest_comparison(&self, result: &ComparisonResult) -> Result<(), TrackerError> {
        self.state.write().await.latest_comparison = Some(result.clone());
        Ok(())
    }

    async fn load_latest_comparison(&self) -> Result<Option<ComparisonResult>, TrackerError> {
        Ok(self.state.read().await.latest_comparison.clone())
    }

    async fn load_rollback_log(&self) -> Result<Vec<ComparisonResult>, TrackerError> {
        Ok(self.state.read().await.rollback_log.clone())
    }
}
