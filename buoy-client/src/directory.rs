//! StationDirectory - the station catalog and its data refreshes.
//!
//! The directory owns every [`Station`] the app knows about, answers
//! proximity queries, and keeps each station's data fresh.
//!
//! # Architecture
//!
//! ```text
//! refresh_all(id) → RefreshGroup (one slot per category)
//!                      ↓ concurrent sub-fetches
//!                   RemoteDataSource
//!                      ↓ each completion, under the group's mutex
//!                   buffer merge → counter decrement → commit on zero
//! ```
//!
//! The catalog is copy-on-write: readers take a cheap `Arc` snapshot, writers
//! clone the map only while a reader still holds the old one.

use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;
use crate::events::DirectoryEvent;
use crate::source::RemoteDataSource;
use async_trait::async_trait;
use buoy_core::{FreshnessTracker, RefreshGroup, RefreshOutcome, Station};
use buoy_types::{DataCategory, FetchError, Location, StationId, Timestamp, UnitSystem};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, info, warn};

/// Shared, immutable view of the catalog.
pub type Catalog = Arc<HashMap<StationId, Station>>;

/// Read access to the catalog for other stores.
#[async_trait]
pub trait StationLookup: Send + Sync {
    /// The station with `id`, if the catalog has it.
    async fn resolve(&self, id: &StationId) -> Option<Station>;

    /// Whether the catalog has `id`.
    async fn is_known(&self, id: &StationId) -> bool {
        self.resolve(id).await.is_some()
    }

    /// Subscribe to catalog and refresh events.
    fn events(&self) -> broadcast::Receiver<DirectoryEvent>;
}

/// The station catalog.
pub struct StationDirectory<S> {
    source: S,
    clock: Arc<dyn Clock>,
    catalog: RwLock<Catalog>,
    groups: DashMap<StationId, Arc<Mutex<RefreshGroup>>>,
    freshness: Mutex<FreshnessTracker>,
    categories: Vec<DataCategory>,
    events: broadcast::Sender<DirectoryEvent>,
}

impl<S> std::fmt::Debug for StationDirectory<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StationDirectory")
            .field("categories", &self.categories)
            .field("refreshing", &self.groups.len())
            .finish_non_exhaustive()
    }
}

impl<S: RemoteDataSource> StationDirectory<S> {
    /// Create an empty directory reading the wall clock.
    pub fn new(source: S, config: &ClientConfig) -> Self {
        Self::with_clock(source, config, Arc::new(SystemClock))
    }

    /// Create an empty directory with an explicit clock.
    pub fn with_clock(source: S, config: &ClientConfig, clock: Arc<dyn Clock>) -> Self {
        let (events, _) = broadcast::channel(config.directory.event_capacity.max(1));
        Self {
            source,
            clock,
            catalog: RwLock::new(Arc::default()),
            groups: DashMap::new(),
            freshness: Mutex::new(FreshnessTracker::new(config.freshness_window())),
            categories: config.categories(),
            events,
        }
    }

    /// Subscribe to directory events.
    pub fn subscribe(&self) -> broadcast::Receiver<DirectoryEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: DirectoryEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// The data source this directory fetches from.
    pub fn source(&self) -> &S {
        &self.source
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Replace the catalog with the source's station list.
    ///
    /// Stations that survive the reload keep their cached data. On failure
    /// the previous catalog stays in place.
    pub async fn load_catalog(&self) -> Result<usize, FetchError> {
        let records = match self.source.list_stations().await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "Catalog load failed, keeping previous catalog");
                self.emit(DirectoryEvent::CatalogUpdateFailed(e.clone()));
                return Err(e);
            }
        };

        let count = {
            let mut catalog = self.catalog.write().await;
            let mut next = HashMap::with_capacity(records.len());
            for record in records {
                let station = match catalog.get(&record.id) {
                    Some(existing) => {
                        let mut station = existing.clone();
                        station.update_info(record);
                        station
                    }
                    None => Station::from_record(record),
                };
                next.insert(station.id.clone(), station);
            }
            let count = next.len();
            *catalog = Arc::new(next);
            count
        };

        info!(stations = count, "Catalog updated");
        self.emit(DirectoryEvent::CatalogUpdated);
        Ok(count)
    }

    /// Snapshot of the whole catalog.
    pub async fn catalog(&self) -> Catalog {
        Arc::clone(&*self.catalog.read().await)
    }

    /// The station with `id`.
    pub async fn station(&self, id: &StationId) -> Option<Station> {
        self.catalog.read().await.get(id).cloned()
    }

    /// Whether the catalog has `id`.
    pub async fn contains(&self, id: &StationId) -> bool {
        self.catalog.read().await.contains_key(id)
    }

    /// Every station, ordered by id.
    pub async fn stations(&self) -> Vec<Station> {
        let catalog = self.catalog().await;
        let mut stations: Vec<Station> = catalog.values().cloned().collect();
        stations.sort_by(|a, b| a.id.cmp(&b.id));
        stations
    }

    /// Number of stations in the catalog.
    pub async fn len(&self) -> usize {
        self.catalog.read().await.len()
    }

    /// Whether the catalog is empty.
    pub async fn is_empty(&self) -> bool {
        self.catalog.read().await.is_empty()
    }

    /// Stations strictly within `radius` of `location`, nearest first.
    ///
    /// `radius` and the returned distances are in km (metric) or mi
    /// (english).
    pub async fn nearby(
        &self,
        location: &Location,
        radius: f64,
        units: UnitSystem,
    ) -> Vec<(Station, f64)> {
        let catalog = self.catalog().await;
        // Id order first so ties are deterministic.
        let mut stations: Vec<&Station> = catalog.values().collect();
        stations.sort_by(|a, b| a.id.cmp(&b.id));

        buoy_core::nearby(stations, location, radius, units)
            .into_iter()
            .map(|(station, distance)| (station.clone(), distance))
            .collect()
    }

    // =========================================================================
    // Refresh
    // =========================================================================

    /// Whether `id` should be fetched again for `units`.
    pub async fn needs_refresh(&self, id: &StationId, units: UnitSystem) -> bool {
        self.freshness
            .lock()
            .await
            .needs_refresh(id, units, self.clock.now())
    }

    /// Time of the last successful refresh of `id`.
    pub async fn last_refresh(&self, id: &StationId) -> Option<Timestamp> {
        self.freshness.lock().await.last_refresh(id)
    }

    /// Whether a refresh group is open for `id`.
    pub fn is_refreshing(&self, id: &StationId) -> bool {
        self.groups.contains_key(id)
    }

    /// Refresh every configured category of `id` in `units`.
    ///
    /// Returns false without fetching when a refresh is already in flight,
    /// the data is still fresh, or the station is unknown. Otherwise runs the
    /// sub-fetches concurrently and returns true once the group has
    /// committed or failed; exactly one of `DataUpdated` or `RefreshFailed`
    /// is emitted per group.
    pub async fn refresh_all(&self, id: &StationId, units: UnitSystem) -> bool {
        if self.is_refreshing(id) {
            debug!(station = %id, "Refresh already in flight");
            return false;
        }
        if !self.contains(id).await {
            warn!(station = %id, "Refresh requested for unknown station");
            return false;
        }
        if !self.needs_refresh(id, units).await {
            debug!(station = %id, %units, "Data still fresh");
            return false;
        }

        let group = match self.groups.entry(id.clone()) {
            Entry::Occupied(_) => {
                debug!(station = %id, "Refresh already in flight");
                return false;
            }
            Entry::Vacant(slot) => {
                let group = Arc::new(Mutex::new(RefreshGroup::new(
                    id.clone(),
                    units,
                    &self.categories,
                )));
                slot.insert(Arc::clone(&group));
                group
            }
        };
        let guard = GroupGuard {
            groups: &self.groups,
            id,
        };

        info!(station = %id, %units, categories = self.categories.len(), "Refresh started");
        self.emit(DirectoryEvent::RefreshStarted(id.clone()));

        let fetches = self.categories.iter().map(|&category| {
            let group = Arc::clone(&group);
            async move {
                let result = self.source.station_data(id, units, Some(category)).await;
                if let Err(e) = &result {
                    debug!(station = %id, %category, error = %e, "Sub-fetch failed");
                }

                let mut group = group.lock().await;
                match group.complete(category, result) {
                    Some(outcome) => Some(self.commit(id, units, outcome).await),
                    None => None,
                }
            }
        });
        let terminal: Vec<DirectoryEvent> =
            join_all(fetches).await.into_iter().flatten().collect();

        // Close the group first so a subscriber can retry on the terminal event.
        drop(guard);
        for event in terminal {
            self.emit(event);
        }
        true
    }

    /// Store a finished group's outcome and return its terminal event.
    async fn commit(
        &self,
        id: &StationId,
        units: UnitSystem,
        outcome: RefreshOutcome,
    ) -> DirectoryEvent {
        match outcome {
            RefreshOutcome::Succeeded { snapshot, failed } => {
                for (category, error) in &failed {
                    warn!(station = %id, %category, error = %error, "Partial refresh");
                }

                let committed = {
                    let mut catalog = self.catalog.write().await;
                    match Arc::make_mut(&mut *catalog).get_mut(id) {
                        Some(station) => {
                            station.add_data(snapshot);
                            true
                        }
                        None => false,
                    }
                };

                if committed {
                    self.freshness
                        .lock()
                        .await
                        .record_success(id.clone(), units, self.clock.now());
                    info!(station = %id, "Refresh committed");
                    DirectoryEvent::DataUpdated(id.clone())
                } else {
                    warn!(station = %id, "Station left the catalog during refresh");
                    DirectoryEvent::RefreshFailed(id.clone())
                }
            }
            RefreshOutcome::Failed { errors } => {
                let errors: Vec<String> = errors
                    .iter()
                    .map(|(category, e)| format!("{}: {}", category, e))
                    .collect();
                warn!(station = %id, errors = ?errors, "Refresh failed");
                DirectoryEvent::RefreshFailed(id.clone())
            }
        }
    }

    /// Fetch and store the time `id` is next expected to report.
    pub async fn fetch_next_update_time(&self, id: &StationId) -> Result<Timestamp, FetchError> {
        if !self.contains(id).await {
            return Err(FetchError::UnknownStation(id.clone()));
        }

        let at = self.source.next_update_time(id).await?;
        {
            let mut catalog = self.catalog.write().await;
            if let Some(station) = Arc::make_mut(&mut *catalog).get_mut(id) {
                station.next_update = Some(at);
            }
        }

        debug!(station = %id, next_update = at.as_secs(), "Next update time stored");
        self.emit(DirectoryEvent::NextUpdateTimeUpdated(id.clone()));
        Ok(at)
    }
}

/// Closes a station's refresh group when the refresh finishes or its future
/// is dropped.
struct GroupGuard<'a> {
    groups: &'a DashMap<StationId, Arc<Mutex<RefreshGroup>>>,
    id: &'a StationId,
}

impl Drop for GroupGuard<'_> {
    fn drop(&mut self) {
        if self.groups.remove(self.id).is_some() {
            debug!(station = %self.id, "Refresh group closed");
        }
    }
}

#[async_trait]
impl<S: RemoteDataSource> StationLookup for StationDirectory<S> {
    async fn resolve(&self, id: &StationId) -> Option<Station> {
        self.station(id).await
    }

    async fn is_known(&self, id: &StationId) -> bool {
        self.contains(id).await
    }

    fn events(&self) -> broadcast::Receiver<DirectoryEvent> {
        self.subscribe()
    }
}
