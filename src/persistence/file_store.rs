//! JSON file implementation of the persistence layer.
//!
//! Layout under the data directory:
//!
//! ```text
//! snapshots/YYYY-MM-DD/{source}_HH-MM-SS.json   history, never overwritten
//! latest/{source}.json                          one slot per feed
//! rollbacks/rollback_log.json                   JSON array, append-only
//! rollbacks/latest_comparison.json              last cycle's verdict
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::SnapshotStore;
use crate::domain::{ComparisonResult, FeedSource, Snapshot};
use crate::error::TrackerError;

const SNAPSHOTS_DIR: &str = "snapshots";
const LATEST_DIR: &str = "latest";
const ROLLBACKS_DIR: &str = "rollbacks";
const ROLLBACK_LOG_FILE: &str = "rollback_log.json";
const LATEST_COMPARISON_FILE: &str = "latest_comparison.json";

/// Filesystem-backed [`SnapshotStore`].
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `root`. Directories are created lazily.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the data directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the latest slot for `source`.
    #[must_use]
    pub fn latest_path(&self, source: FeedSource) -> PathBuf {
        self.root
            .join(LATEST_DIR)
            .join(format!("{}.json", source.as_str()))
    }

    /// Path of the rollback log.
    #[must_use]
    pub fn rollback_log_path(&self) -> PathBuf {
        self.root.join(ROLLBACKS_DIR).join(ROLLBACK_LOG_FILE)
    }

    /// Path of the latest comparison slot.
    #[must_use]
    pub fn latest_comparison_path(&self) -> PathBuf {
        self.root.join(ROLLBACKS_DIR).join(LATEST_COMPARISON_FILE)
    }

    /// Directory and base file stem for a history entry.
    fn snapshot_location(&self, snapshot: &Snapshot) -> (PathBuf, String) {
        let dir = self
            .root
            .join(SNAPSHOTS_DIR)
            .join(snapshot.timestamp.format("%Y-%m-%d").to_string());
        let stem = format!(
            "{}_{}",
            snapshot.source.as_str(),
            snapshot.timestamp.format("%H-%M-%S")
        );
        (dir, stem)
    }
}

impl SnapshotStore for FileStore {
    async fn save_snapshot(&self, snapshot: &Snapshot) -> Result<String, TrackerError> {
        let (dir, stem) = self.snapshot_location(snapshot);
        create_dir(&dir).await?;
        let bytes = encode(snapshot)?;

        let mut suffix = 0_u32;
        loop {
            let name = if suffix == 0 {
                format!("{stem}.json")
            } else {
                format!("{stem}_{suffix}.json")
            };
            let path = dir.join(&name);
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(mut file) => {
                    file.write_all(&bytes).await.map_err(|e| storage(&path, &e))?;
                    file.flush().await.map_err(|e| storage(&path, &e))?;
                    tracing::debug!(path = %path.display(), "snapshot saved");
                    let key = path
                        .strip_prefix(self.root.join(SNAPSHOTS_DIR))
                        .unwrap_or(&path)
                        .to_string_lossy()
                        .into_owned();
                    return Ok(key);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    suffix += 1;
                }
                Err(e) => return Err(storage(&path, &e)),
            }
        }
    }

    async fn save_latest(&self, snapshot: &Snapshot) -> Result<(), TrackerError> {
        write_json(&self.latest_path(snapshot.source), snapshot).await
    }

    async fn load_latest(&self, source: FeedSource) -> Result<Option<Snapshot>, TrackerError> {
        read_json(&self.latest_path(source)).await
    }

    async fn append_rollback_log(&self, result: &ComparisonResult) -> Result<bool, TrackerError> {
        if !result.has_rollbacks() {
            return Ok(false);
        }

        let path = self.rollback_log_path();
        let mut entries: Vec<serde_json::Value> = read_json(&path).await?.unwrap_or_default();
        let entry = serde_json::to_value(result)
            .map_err(|e| TrackerError::Storage(format!("failed to encode log entry: {e}")))?;
        entries.push(entry);
        write_json(&path, &entries).await?;

        tracing::debug!(path = %path.display(), entries = entries.len(), "rollback log appended");
        Ok(true)
    }

    async fn save_latest_comparison(&self, result: &ComparisonResult) -> Result<(), TrackerError> {
        write_json(&self.latest_comparison_path(), result).await
    }

    async fn load_latest_comparison(&self) -> Result<Option<ComparisonResult>, TrackerError> {
        read_json(&self.latest_comparison_path()).await
    }

    async fn load_rollback_log(&self) -> Result<Vec<ComparisonResult>, TrackerError> {
        Ok(read_json(&self.rollback_log_path())
            .await?
            .unwrap_or_default())
    }
}

fn storage(path: &Path, err: &std::io::Error) -> TrackerError {
    TrackerError::Storage(format!("{}: {err}", path.display()))
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, TrackerError> {
    serde_json::to_vec_pretty(value)
        .map_err(|e| TrackerError::Storage(format!("failed to encode json: {e}")))
}

async fn create_dir(dir: &Path) -> Result<(), TrackerError> {
    fs::create_dir_all(dir).await.map_err(|e| storage(dir, &e))
}

/// Reads and decodes `path`; a missing file is `None`.
async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, TrackerError> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(storage(path, &e)),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| TrackerError::CorruptState {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Replaces `path` through a sibling temp file and a rename.
async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), TrackerError> {
    if let Some(parent) = path.parent() {
        create_dir(parent).await?;
    }
    let bytes = encode(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, &bytes).await.map_err(|e| storage(&tmp, &e))?;
    fs::rename(&tmp, path).await.map_err(|e| storage(path, &e))
}
