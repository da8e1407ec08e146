//! Domain layer: overflow records, feed snapshots, and rollback verdicts.
//!
//! These types are pure data. They serialize with the exact field names
//! used in the persisted JSON files so that history written by earlier
//! runs keeps loading.

pub mod comparison;
pub mod record;
pub mod snapshot;

pub use comparison::{ComparisonResult, RollbackEvent, RollbackLevel};
pub use record::{DischargeStatus, FeedSource, OverflowRecord};
pub use snapshot::Snapshot;
