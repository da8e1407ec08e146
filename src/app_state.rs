//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::persistence::FileStore;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Store written by the detection cycle; the dashboard only reads it.
    pub store: Arc<FileStore>,
}

impl AppState {
    /// Creates state over the given store.
    #[must_use]
    pub fn new(store: FileStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}
