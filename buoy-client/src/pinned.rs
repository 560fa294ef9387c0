//! PinnedStationCache - a single persisted station for widgets.
//!
//! Constrained surfaces cannot load the whole catalog. They pin one station,
//! restore it from local storage on start, and refresh it on their own
//! schedule through the same data source the directory uses.

use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::source::RemoteDataSource;
use crate::storage::{get_json, set_json, KeyValueStore};
use buoy_core::{is_stale, Station, StationDataSnapshot};
use buoy_types::{StationId, Timestamp, UnitSystem};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Local storage keys for the pinned cache.
pub mod keys {
    /// Versioned station record.
    pub const PINNED_STATION: &str = "pinned_station";
    /// Unit system for fetches.
    pub const PINNED_UNITS: &str = "pinned_units";
}

/// Current version of the persisted record.
pub const PINNED_RECORD_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct PinnedRecord {
    version: u32,
    station: Station,
}

#[derive(Debug, Default)]
struct PinnedState {
    station: Option<Station>,
    units: UnitSystem,
}

/// Cache for one pinned station.
pub struct PinnedStationCache<S> {
    source: S,
    local: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    freshness_window: Duration,
    coalescing_window: Duration,
    state: Mutex<PinnedState>,
}

impl<S> std::fmt::Debug for PinnedStationCache<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinnedStationCache")
            .field("freshness_window", &self.freshness_window)
            .finish_non_exhaustive()
    }
}

/// Whether a pinned station should be fetched again at `now`.
///
/// With a known next update time the station is stale once that time has
/// passed or when it holds no data. Without one, it is stale when it holds
/// no data or its newest write is older than `window`.
pub fn pinned_is_stale(station: &Station, now: Timestamp, window: Duration) -> bool {
    match station.next_update {
        Some(next) => now > next || station.latest_data().is_none(),
        None => match station.latest_update_time() {
            Some(last) => is_stale(last, now, window),
            None => true,
        },
    }
}

impl<S: RemoteDataSource> PinnedStationCache<S> {
    /// Open the cache, restoring any persisted station.
    pub async fn open(
        source: S,
        local: Arc<dyn KeyValueStore>,
        config: &ClientConfig,
    ) -> Result<Self, ClientError> {
        Self::with_clock(source, local, config, Arc::new(SystemClock)).await
    }

    /// Open the cache with an explicit clock.
    pub async fn with_clock(
        source: S,
        local: Arc<dyn KeyValueStore>,
        config: &ClientConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ClientError> {
        let units = match get_json::<UnitSystem, _>(local.as_ref(), keys::PINNED_UNITS).await {
            Ok(units) => units.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable pinned units");
                UnitSystem::default()
            }
        };
        let station = match get_json::<PinnedRecord, _>(local.as_ref(), keys::PINNED_STATION).await
        {
            Ok(Some(record)) if record.version == PINNED_RECORD_VERSION => Some(record.station),
            Ok(Some(record)) => {
                warn!(version = record.version, "Discarding pinned station with unknown version");
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Discarding unreadable pinned station");
                None
            }
        };

        if let Some(station) = &station {
            debug!(station = %station.id, %units, "Restored pinned station");
        }

        Ok(Self {
            source,
            local,
            clock,
            freshness_window: config.freshness_window(),
            coalescing_window: config.coalescing_window(),
            state: Mutex::new(PinnedState { station, units }),
        })
    }

    /// Whether `id` is the pinned station.
    pub async fn identify(&self, id: &StationId) -> bool {
        matches!(&self.state.lock().await.station, Some(s) if &s.id == id)
    }

    /// The pinned station.
    pub async fn station(&self) -> Option<Station> {
        self.state.lock().await.station.clone()
    }

    /// Unit system used for fetches.
    pub async fn units(&self) -> UnitSystem {
        self.state.lock().await.units
    }

    /// Pin `id`: fetch its detail and latest data and replace the cache.
    ///
    /// A failed data fetch still pins the station, without data.
    pub async fn load(&self, id: &StationId) -> Result<Station, ClientError> {
        let mut state = self.state.lock().await;
        let mut station = Station::from_record(self.source.station_detail(id).await?);

        match self.source.station_data(id, state.units, None).await {
            Ok(record) => {
                let mut snapshot = StationDataSnapshot::from_record(&record);
                snapshot.convert(state.units);
                station.add_data(snapshot);
            }
            Err(e) => warn!(station = %id, error = %e, "Pinned station has no data yet"),
        }

        info!(station = %id, "Pinned station loaded");
        state.station = Some(station.clone());
        self.persist_station(&state).await?;
        Ok(station)
    }

    /// Refresh the pinned station if stale, or always when `force` is set.
    ///
    /// Returns `None` when nothing is pinned. Fresh data is returned
    /// without fetching.
    pub async fn refresh(&self, force: bool) -> Result<Option<Station>, ClientError> {
        let mut state = self.state.lock().await;
        let units = state.units;
        let Some(station) = state.station.as_mut() else {
            return Ok(None);
        };

        let now = self.clock.now();
        if !force && !pinned_is_stale(station, now, self.freshness_window) {
            debug!(station = %station.id, "Pinned station still fresh");
            return Ok(Some(station.clone()));
        }

        let record = self.source.station_data(&station.id, units, None).await?;
        station.apply_record(&record, self.coalescing_window);
        let id = station.id.clone();
        info!(station = %id, "Pinned station refreshed");
        self.persist_station(&state).await?;

        match self.source.next_update_time(&id).await {
            Ok(at) => {
                if let Some(station) = state.station.as_mut() {
                    station.next_update = Some(at);
                }
                self.persist_station(&state).await?;
            }
            Err(e) => debug!(station = %id, error = %e, "No next update time"),
        }

        Ok(state.station.clone())
    }

    /// Change the unit system, converting cached data.
    pub async fn set_units(&self, units: UnitSystem) -> Result<bool, ClientError> {
        let mut state = self.state.lock().await;
        if state.units == units {
            return Ok(false);
        }

        state.units = units;
        if let Some(station) = state.station.as_mut() {
            station.convert(units);
        }
        set_json(self.local.as_ref(), keys::PINNED_UNITS, &units).await?;
        self.persist_station(&state).await?;
        Ok(true)
    }

    async fn persist_station(&self, state: &PinnedState) -> Result<(), ClientError> {
        let Some(station) = &state.station else {
            return Ok(());
        };
        let record = PinnedRecord {
            version: PINNED_RECORD_VERSION,
            station: station.clone(),
        };
        set_json(self.local.as_ref(), keys::PINNED_STATION, &record).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::source::MockDataSource;
    use crate::storage::MemoryStore;
    use buoy_types::{DataRecord, FetchError, Location, StationRecord, WaveData, WeatherData};

    const T0: i64 = 1_700_000_000;

    fn id() -> StationId {
        StationId::new("44097")
    }

    fn data(secs: i64, wind: f64) -> DataRecord {
        DataRecord {
            date: Timestamp::from_secs(secs),
            units: UnitSystem::Metric,
            wave: WaveData {
                average_period: Some(9.0),
                ..Default::default()
            },
            weather: WeatherData {
                wind_speed: Some(wind),
                ..Default::default()
            },
        }
    }

    fn source() -> MockDataSource {
        let source = MockDataSource::new();
        source.add_station(StationRecord {
            id: id(),
            location: Location::new(40.97, -71.13).with_name("Block Island"),
            metadata: Default::default(),
        });
        source.set_data(id(), data(T0, 5.0));
        source
    }

    async fn cache(
        source: &MockDataSource,
        local: &MemoryStore,
        clock: &ManualClock,
    ) -> PinnedStationCache<MockDataSource> {
        PinnedStationCache::with_clock(
            source.clone(),
            Arc::new(local.clone()),
            &ClientConfig::default(),
            Arc::new(clock.clone()),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn load_pins_and_persists() {
        let source = source();
        let local = MemoryStore::new();
        let clock = ManualClock::new(Timestamp::from_secs(T0));
        let pinned = cache(&source, &local, &clock).await;

        let station = pinned.load(&id()).await.unwrap();
        assert_eq!(station.location.name.as_deref(), Some("Block Island"));
        assert_eq!(station.data.len(), 1);
        assert!(pinned.identify(&id()).await);
        assert!(!pinned.identify(&StationId::new("other")).await);

        let restored = cache(&source, &local, &clock).await;
        assert_eq!(restored.station().await, Some(station));
    }

    #[tokio::test]
    async fn refresh_without_pin_returns_none() {
        let source = source();
        let clock = ManualClock::new(Timestamp::from_secs(T0));
        let pinned = cache(&source, &MemoryStore::new(), &clock).await;
        assert!(pinned.refresh(true).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn fresh_data_is_returned_without_fetching() {
        let source = source();
        let clock = ManualClock::new(Timestamp::from_secs(T0));
        let pinned = cache(&source, &MemoryStore::new(), &clock).await;
        pinned.load(&id()).await.unwrap();
        let calls = source.data_calls().len();

        clock.advance(Duration::from_secs(10 * 60));
        pinned.refresh(false).await.unwrap().unwrap();
        assert_eq!(source.data_calls().len(), calls);

        pinned.refresh(true).await.unwrap().unwrap();
        assert_eq!(source.data_calls().len(), calls + 1);
    }

    #[tokio::test]
    async fn stale_data_is_merged_and_next_update_stored() {
        let source = source();
        let clock = ManualClock::new(Timestamp::from_secs(T0));
        let pinned = cache(&source, &MemoryStore::new(), &clock).await;
        pinned.load(&id()).await.unwrap();

        clock.advance(Duration::from_secs(40 * 60));
        source.set_data(id(), data(T0 + 40 * 60, 8.0));
        let next = Timestamp::from_secs(T0 + 70 * 60);
        source.set_next_update(id(), next);

        let station = pinned.refresh(false).await.unwrap().unwrap();
        let latest = station.latest_data().unwrap();
        assert_eq!(latest.weather.wind_speed, Some(8.0));
        assert_eq!(latest.date, Timestamp::from_secs(T0));
        assert_eq!(station.next_update, Some(next));

        // Before the announced update the data is fresh, after it stale.
        clock.set(Timestamp::from_secs(T0 + 60 * 60));
        assert!(!pinned_is_stale(&station, clock.now(), Duration::from_secs(1800)));
        clock.set(Timestamp::from_secs(T0 + 71 * 60));
        assert!(pinned_is_stale(&station, clock.now(), Duration::from_secs(1800)));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_cached_station() {
        let source = source();
        let clock = ManualClock::new(Timestamp::from_secs(T0));
        let pinned = cache(&source, &MemoryStore::new(), &clock).await;
        let before = pinned.load(&id()).await.unwrap();

        source.fail_next_data(FetchError::Transport("offline".into()));
        assert!(pinned.refresh(true).await.is_err());
        assert_eq!(pinned.station().await, Some(before));
    }

    #[tokio::test]
    async fn set_units_converts_and_persists() {
        let source = source();
        let local = MemoryStore::new();
        let clock = ManualClock::new(Timestamp::from_secs(T0));
        let pinned = cache(&source, &local, &clock).await;
        pinned.load(&id()).await.unwrap();

        assert!(pinned.set_units(UnitSystem::English).await.unwrap());
        assert!(!pinned.set_units(UnitSystem::English).await.unwrap());

        let station = pinned.station().await.unwrap();
        let latest = station.latest_data().unwrap();
        assert_eq!(latest.units, UnitSystem::English);
        let mph = latest.weather.wind_speed.unwrap();
        assert!((mph - 5.0 * 2.237).abs() < 1e-9);

        let restored = cache(&source, &local, &clock).await;
        assert_eq!(restored.units().await, UnitSystem::English);
        assert_eq!(
            restored.station().await.unwrap().data_units(),
            Some(UnitSystem::English)
        );
    }

    #[tokio::test]
    async fn unknown_record_version_is_discarded() {
        let source = source();
        let local = MemoryStore::new();
        let record = PinnedRecord {
            version: 99,
            station: Station::new(id(), Location::new(40.97, -71.13)),
        };
        set_json(&local, keys::PINNED_STATION, &record).await.unwrap();
        let clock = ManualClock::new(Timestamp::from_secs(T0));

        let pinned = cache(&source, &local, &clock).await;
        assert!(pinned.station().await.is_none());
    }

    #[tokio::test]
    async fn unreadable_units_fall_back_to_metric() {
        let source = source();
        let local = MemoryStore::new();
        local
            .set(keys::PINNED_UNITS, serde_json::json!("kelvin"))
            .await
            .unwrap();
        let clock = ManualClock::new(Timestamp::from_secs(T0));

        let pinned = cache(&source, &local, &clock).await;
        assert_eq!(pinned.units().await, UnitSystem::Metric);
    }
}
