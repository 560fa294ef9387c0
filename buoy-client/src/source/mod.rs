//! Remote data source abstraction.
//!
//! The station directory and the pinned cache never talk to the network
//! directly. They go through [`RemoteDataSource`], an opaque async fetch
//! capability that yields station records and measurement records.
//!
//! # Design
//!
//! - `list_stations()` returns the full catalog
//! - `station_detail()` returns one station's location and metadata
//! - `station_data()` returns the latest readings, optionally restricted to
//!   one [`DataCategory`]
//! - `next_update_time()` returns when the station is next expected to report
//!
//! # Example
//!
//! ```ignore
//! let source = MockDataSource::new();
//! source.add_station(record);
//! let stations = source.list_stations().await?;
//! ```

mod mock;

pub use mock::MockDataSource;

use async_trait::async_trait;
use buoy_types::{DataCategory, DataRecord, FetchError, StationId, StationRecord, Timestamp, UnitSystem};
use std::sync::Arc;

/// Async fetch capability for station catalog and readings.
#[async_trait]
pub trait RemoteDataSource: Send + Sync {
    /// Fetch every known station.
    async fn list_stations(&self) -> Result<Vec<StationRecord>, FetchError>;

    /// Fetch one station's location and metadata.
    async fn station_detail(&self, id: &StationId) -> Result<StationRecord, FetchError>;

    /// Fetch the latest readings for a station in the given unit system.
    ///
    /// With `category` set, only that field group is populated.
    async fn station_data(
        &self,
        id: &StationId,
        units: UnitSystem,
        category: Option<DataCategory>,
    ) -> Result<DataRecord, FetchError>;

    /// Fetch the time the station is next expected to report.
    async fn next_update_time(&self, id: &StationId) -> Result<Timestamp, FetchError>;
}

#[async_trait]
impl<T: RemoteDataSource + ?Sized> RemoteDataSource for Arc<T> {
    async fn list_stations(&self) -> Result<Vec<StationRecord>, FetchError> {
        (**self).list_stations().await
    }

    async fn station_detail(&self, id: &StationId) -> Result<StationRecord, FetchError> {
        (**self).station_detail(id).await
    }

    async fn station_data(
        &self,
        id: &StationId,
        units: UnitSystem,
        category: Option<DataCategory>,
    ) -> Result<DataRecord, FetchError> {
        (**self).station_data(id, units, category).await
    }

    async fn next_update_time(&self, id: &StationId) -> Result<Timestamp, FetchError> {
        (**self).next_update_time(id).await
    }
}
