//! Mock data source for testing.
//!
//! Serves canned records, counts calls, and can be paused so that tests
//! observe a refresh while it is still in flight.

use super::RemoteDataSource;
use async_trait::async_trait;
use buoy_types::{
    DataCategory, DataRecord, FetchError, StationId, StationRecord, Timestamp, UnitSystem,
    WaveData, WeatherData,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// Mock data source for testing.
///
/// Clones share state, so a test can keep a handle while a store owns
/// another.
#[derive(Debug)]
pub struct MockDataSource {
    inner: Arc<Mutex<MockDataSourceInner>>,
    paused: Arc<watch::Sender<bool>>,
}

#[derive(Debug, Default)]
struct MockDataSourceInner {
    stations: Vec<StationRecord>,
    records: HashMap<StationId, DataRecord>,
    next_updates: HashMap<StationId, Timestamp>,
    category_failures: HashMap<(StationId, DataCategory), FetchError>,
    fail_next_list: Option<FetchError>,
    fail_next_data: Option<FetchError>,
    data_calls: Vec<(StationId, UnitSystem, Option<DataCategory>)>,
    list_calls: usize,
}

impl Default for MockDataSource {
    fn default() -> Self {
        let (paused, _) = watch::channel(false);
        Self {
            inner: Arc::default(),
            paused: Arc::new(paused),
        }
    }
}

impl Clone for MockDataSource {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            paused: Arc::clone(&self.paused),
        }
    }
}

impl MockDataSource {
    /// Create an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockDataSourceInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a station to the catalog.
    pub fn add_station(&self, record: StationRecord) {
        let mut inner = self.lock();
        inner.stations.retain(|s| s.id != record.id);
        inner.stations.push(record);
    }

    /// Remove a station from the catalog.
    pub fn remove_station(&self, id: &StationId) {
        self.lock().stations.retain(|s| &s.id != id);
    }

    /// Set the readings returned for a station.
    pub fn set_data(&self, id: StationId, record: DataRecord) {
        self.lock().records.insert(id, record);
    }

    /// Set the next update time returned for a station.
    pub fn set_next_update(&self, id: StationId, at: Timestamp) {
        self.lock().next_updates.insert(id, at);
    }

    /// Make every fetch of one category for a station fail.
    pub fn fail_category(&self, id: StationId, category: DataCategory, error: FetchError) {
        self.lock().category_failures.insert((id, category), error);
    }

    /// Cause the next `list_stations()` to fail.
    pub fn fail_next_list(&self, error: FetchError) {
        self.lock().fail_next_list = Some(error);
    }

    /// Cause the next `station_data()` to fail.
    pub fn fail_next_data(&self, error: FetchError) {
        self.lock().fail_next_data = Some(error);
    }

    /// Hold every `station_data()` call until [`resume`](Self::resume).
    pub fn pause(&self) {
        self.paused.send_replace(true);
    }

    /// Release held and future `station_data()` calls.
    pub fn resume(&self) {
        self.paused.send_replace(false);
    }

    /// Every `station_data()` call so far.
    pub fn data_calls(&self) -> Vec<(StationId, UnitSystem, Option<DataCategory>)> {
        self.lock().data_calls.clone()
    }

    /// Number of `list_stations()` calls so far.
    pub fn list_calls(&self) -> usize {
        self.lock().list_calls
    }
}

#[async_trait]
impl RemoteDataSource for MockDataSource {
    async fn list_stations(&self) -> Result<Vec<StationRecord>, FetchError> {
        let mut inner = self.lock();
        inner.list_calls += 1;

        if let Some(error) = inner.fail_next_list.take() {
            return Err(error);
        }
        Ok(inner.stations.clone())
    }

    async fn station_detail(&self, id: &StationId) -> Result<StationRecord, FetchError> {
        let inner = self.lock();
        inner
            .stations
            .iter()
            .find(|s| &s.id == id)
            .cloned()
            .ok_or_else(|| FetchError::UnknownStation(id.clone()))
    }

    async fn station_data(
        &self,
        id: &StationId,
        units: UnitSystem,
        category: Option<DataCategory>,
    ) -> Result<DataRecord, FetchError> {
        self.lock().data_calls.push((id.clone(), units, category));

        let mut paused = self.paused.subscribe();
        // A dropped sender cannot happen while `self` is alive.
        let _ = paused.wait_for(|p| !*p).await;

        let mut inner = self.lock();
        if let Some(error) = inner.fail_next_data.take() {
            return Err(error);
        }
        if let Some(category) = category {
            if let Some(error) = inner.category_failures.get(&(id.clone(), category)) {
                return Err(error.clone());
            }
        }

        let mut record = inner
            .records
            .get(id)
            .cloned()
            .ok_or(FetchError::EmptyResponse)?;
        match category {
            Some(DataCategory::Wave) => record.weather = WeatherData::default(),
            Some(DataCategory::Weather) => record.wave = WaveData::default(),
            None => {}
        }
        Ok(record)
    }

    async fn next_update_time(&self, id: &StationId) -> Result<Timestamp, FetchError> {
        self.lock()
            .next_updates
            .get(id)
            .copied()
            .ok_or(FetchError::EmptyResponse)
    }
}
