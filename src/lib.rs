//! # nsoh-rollback-tracker
//!
//! Watches the National Storm Overflow Hub (NSOH) feed for timestamps that
//! move backwards between captures, using the Thames Water open data feed
//! as context.
//!
//! Each invocation captures both feeds, compares the NSOH snapshot against
//! the previous one, and stores snapshots, the latest verdict and an
//! append-only rollback log. A small read-only API serves that state to a
//! dashboard.
//!
//! ## Architecture
//!
//! ```text
//! NSOH ArcGIS        Thames Water
//!     │                   │
//!     └── Fetchers (fetch/) ┘
//!             │
//!     CycleService (service/)
//!             │
//!     ├── Detector + Aggregator (detection/)
//!     │
//!     └── SnapshotStore (persistence/) ── JSON files
//!                                          │
//!                           Dashboard API (api/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod detection;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod persistence;
pub mod service;
