//! Service layer: detection cycle orchestration.
//!
//! [`CycleService`] sequences the fetchers, the store and the detector for
//! one invocation and reports a [`CycleOutcome`].

pub mod cycle_service;

pub use cycle_service::{CycleOutcome, CycleService};
