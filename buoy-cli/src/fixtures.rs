//! Fixture-backed data source.
//!
//! Serves a station catalog and readings from a JSON file so the stores can
//! be exercised without a network:
//!
//! ```json
//! {
//!   "stations": [{ "id": "44097", "location": { "latitude": 40.97, "longitude": -71.13 } }],
//!   "data": { "44097": { "date": 1700000000, "units": "metric", "weather": { "wind_speed": 5.0 } } },
//!   "next_updates": { "44097": 1700001800 }
//! }
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use buoy_client::RemoteDataSource;
use buoy_types::{
    DataCategory, DataRecord, FetchError, StationId, StationRecord, Timestamp, UnitSystem,
    WaveData, WeatherData,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Contents of a fixture file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureFile {
    /// Station catalog.
    #[serde(default)]
    pub stations: Vec<StationRecord>,
    /// Latest readings per station.
    #[serde(default)]
    pub data: HashMap<StationId, DataRecord>,
    /// Next expected report per station.
    #[serde(default)]
    pub next_updates: HashMap<StationId, Timestamp>,
}

/// Data source answering from a [`FixtureFile`].
#[derive(Debug, Clone, Default)]
pub struct FixtureSource {
    fixtures: FixtureFile,
}

impl FixtureSource {
    /// Wrap already-parsed fixtures.
    pub fn new(fixtures: FixtureFile) -> Self {
        Self { fixtures }
    }

    /// Load fixtures from a JSON file.
    pub async fn load(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read fixtures from {}", path.display()))?;
        let fixtures = serde_json::from_str(&contents).context("Invalid fixture file")?;
        Ok(Self::new(fixtures))
    }
}

#[async_trait]
impl RemoteDataSource for FixtureSource {
    async fn list_stations(&self) -> Result<Vec<StationRecord>, FetchError> {
        Ok(self.fixtures.stations.clone())
    }

    async fn station_detail(&self, id: &StationId) -> Result<StationRecord, FetchError> {
        self.fixtures
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
        let mut record = self
            .fixtures
            .data
            .get(id)
            .cloned()
            .ok_or(FetchError::EmptyResponse)?;

        // The fixture is recorded in one unit system; answer in the one asked for.
        if record.units != units {
            record.wave.convert(units);
            record.weather.convert(record.units, units);
            record.units = units;
        }

        match category {
            Some(DataCategory::Wave) => record.weather = WeatherData::default(),
            Some(DataCategory::Weather) => record.wave = WaveData::default(),
            None => {}
        }
        if category.is_some_and(|c| !record.has(c)) {
            return Err(FetchError::EmptyResponse);
        }
        Ok(record)
    }

    async fn next_update_time(&self, id: &StationId) -> Result<Timestamp, FetchError> {
        self.fixtures
            .next_updates
            .get(id)
            .copied()
            .ok_or(FetchError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing::FIXTURES;
    use tempfile::tempdir;

    #[tokio::test]
    async fn loads_sample_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fixtures.json");
        tokio::fs::write(&path, FIXTURES).await.unwrap();

        let source = FixtureSource::load(&path).await.unwrap();
        assert_eq!(source.list_stations().await.unwrap().len(), 2);
        assert_eq!(
            source
                .next_update_time(&StationId::new("44097"))
                .await
                .unwrap(),
            Timestamp::from_secs(1_700_001_800)
        );
    }

    #[tokio::test]
    async fn converts_to_requested_units() {
        let fixtures: FixtureFile = serde_json::from_str(FIXTURES).unwrap();
        let source = FixtureSource::new(fixtures);

        let record = source
            .station_data(&StationId::new("44097"), UnitSystem::English, None)
            .await
            .unwrap();
        assert_eq!(record.units, UnitSystem::English);
        let temp = record.weather.air_temperature.unwrap();
        assert!((temp - 50.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn missing_category_is_empty_response() {
        let fixtures: FixtureFile = serde_json::from_str(FIXTURES).unwrap();
        let source = FixtureSource::new(fixtures);

        let err = source
            .station_data(
                &StationId::new("44013"),
                UnitSystem::Metric,
                Some(DataCategory::Wave),
            )
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::EmptyResponse);
    }

    #[tokio::test]
    async fn category_filter_clears_other_group() {
        let fixtures: FixtureFile = serde_json::from_str(FIXTURES).unwrap();
        let source = FixtureSource::new(fixtures);

        let record = source
            .station_data(
                &StationId::new("44097"),
                UnitSystem::Metric,
                Some(DataCategory::Weather),
            )
            .await
            .unwrap();
        assert!(record.has(DataCategory::Weather));
        assert!(!record.has(DataCategory::Wave));
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(FixtureSource::load(&dir.path().join("nope.json")).await.is_err());
    }
}
