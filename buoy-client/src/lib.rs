//! # buoy-client
//!
//! Async stores for the BuoyFinder sync engine.
//!
//! This is the library that applications use to keep station data and user
//! preferences in sync.
//!
//! ## Features
//!
//! - **Station Directory**: catalog, proximity queries, coalesced per-station
//!   refreshes with freshness tracking
//! - **Settings Store**: preferences persisted locally and, while signed in,
//!   to a remote per-user document with live reconciliation
//! - **Pinned Station Cache**: one persisted station for widgets
//! - **Source Abstraction**: pluggable data source (HTTP client, fixtures, mock)
//!
//! ## Example
//!
//! ```ignore
//! use buoy_client::{ClientConfig, MockDataSource, StationDirectory};
//!
//! let config = ClientConfig::default();
//! let directory = StationDirectory::new(MockDataSource::new(), &config);
//! directory.load_catalog().await?;
//!
//! // Fetch wave and weather data concurrently
//! directory.refresh_all(&station_id, UnitSystem::Metric).await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod config;
pub mod directory;
pub mod error;
pub mod events;
pub mod pinned;
pub mod remote;
pub mod settings;
pub mod source;
pub mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ClientConfig, ConfigError};
pub use directory::{Catalog, StationDirectory, StationLookup};
pub use error::ClientError;
pub use events::{DirectoryEvent, SettingsEvent};
pub use pinned::{pinned_is_stale, PinnedStationCache, PINNED_RECORD_VERSION};
pub use remote::{MemoryRemoteStore, RemoteError, RemotePreferenceStore, UserId};
pub use settings::SettingsStore;
pub use source::{MockDataSource, RemoteDataSource};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore, StorageError};
