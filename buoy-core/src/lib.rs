//! # buoy-core
//!
//! Pure logic for the BuoyFinder sync engine (no I/O, instant tests).
//!
//! This crate implements the merge, freshness and reconciliation rules for
//! station data and user preferences without any network or disk I/O.
//!
//! ## Design Philosophy
//!
//! Every function here takes the current time and the incoming data as
//! arguments instead of reading a clock or calling a service. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (same input → same output)
//! - Easy reasoning about staleness windows at their exact boundaries
//!
//! The actual I/O (fetching, persisting, subscribing) is performed by
//! `buoy-client`, which drives these types from its stores.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod freshness;
pub mod geo;
pub mod preferences;
pub mod refresh;
pub mod snapshot;
pub mod station;

pub use freshness::{
    is_stale, FreshnessTracker, DEFAULT_COALESCING_WINDOW, DEFAULT_FRESHNESS_WINDOW,
};
pub use geo::{distance, nearby};
pub use preferences::{
    DisplayVariable, InitialView, MergeReport, PreferenceSource, Preferences, PreferencesError,
};
pub use refresh::{RefreshGroup, RefreshOutcome};
pub use snapshot::StationDataSnapshot;
pub use station::{ApplyOutcome, Station};
