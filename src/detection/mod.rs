//! Rollback detection: pure comparison of two primary snapshots.
//!
//! Nothing in this module touches storage or the network. The
//! [`detector`] finds regressed locations and the [`aggregator`] turns
//! them into a [`crate::domain::ComparisonResult`].

pub mod aggregator;
pub mod detector;

pub use aggregator::{DATASET_LEVEL_THRESHOLD_PERCENT, aggregate, is_dataset_level, rollback_percentage};
pub use detector::{detect_record_rollback, detect_rollbacks, detect_rollbacks_at};
