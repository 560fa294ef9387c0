//! Stations and their cached data.
//!
//! A [`Station`] keeps its snapshots newest first. Two paths write to it:
//! - [`Station::add_data`] commits a finished refresh: append, drop entries
//!   in other unit systems, sort descending by date.
//! - [`Station::apply_update`] folds a single category into the latest
//!   snapshot, applying the coalescing window rules.

use crate::geo;
use crate::snapshot::StationDataSnapshot;
use buoy_types::{
    DataCategory, DataRecord, Location, StationId, StationMetadata, StationRecord, Timestamp,
    UnitSystem,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A monitoring station and its cached data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// Station identifier.
    pub id: StationId,
    /// Position.
    pub location: Location,
    /// Descriptive metadata.
    #[serde(default)]
    pub metadata: StationMetadata,
    /// Cached snapshots, newest first, all in the same unit system.
    #[serde(default)]
    pub data: Vec<StationDataSnapshot>,
    /// When the station is next expected to report.
    #[serde(default)]
    pub next_update: Option<Timestamp>,
}

/// What [`Station::apply_update`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// A new snapshot was started at the incoming timestamp.
    Replaced,
    /// The incoming category was merged into the latest snapshot.
    Merged {
        /// Whether the other category was cleared as stale first.
        reset_other: bool,
    },
}

impl Station {
    /// Create a station with no data.
    pub fn new(id: StationId, location: Location) -> Self {
        Self {
            id,
            location,
            metadata: StationMetadata::default(),
            data: Vec::new(),
            next_update: None,
        }
    }

    /// Create a station from a catalog record.
    pub fn from_record(record: StationRecord) -> Self {
        Self {
            id: record.id,
            location: record.location,
            metadata: record.metadata,
            data: Vec::new(),
            next_update: None,
        }
    }

    /// Refresh location and metadata from a record, keeping cached data.
    pub fn update_info(&mut self, record: StationRecord) {
        self.location = record.location;
        self.metadata = record.metadata;
    }

    /// The newest snapshot.
    pub fn latest_data(&self) -> Option<&StationDataSnapshot> {
        self.data.first()
    }

    /// The newest write to any category of the newest snapshot.
    pub fn latest_update_time(&self) -> Option<Timestamp> {
        self.latest_data().map(|s| s.latest_update())
    }

    /// Unit system of the cached data.
    pub fn data_units(&self) -> Option<UnitSystem> {
        self.latest_data().map(|s| s.units)
    }

    /// Distance to `location` in the unit system's distance unit.
    pub fn distance_to(&self, location: &Location, units: UnitSystem) -> f64 {
        geo::distance(&self.location, location, units)
    }

    /// Commit a snapshot.
    ///
    /// Entries in a different unit system are evicted; the rest are kept
    /// sorted newest first.
    pub fn add_data(&mut self, snapshot: StationDataSnapshot) {
        let units = snapshot.units;
        self.data.push(snapshot);
        self.data.retain(|s| s.units == units);
        self.data.sort_by(|a, b| b.date.cmp(&a.date));
    }

    /// Fold one category of `record` into the latest snapshot.
    ///
    /// A new snapshot dated at `record.date` is started when there is none or
    /// when the record is more than `window` newer than the latest write.
    /// Otherwise, if the other category was last written more than `window`
    /// before the record, it is cleared so fresh and stale readings never sit
    /// side by side. Exactly `window` apart is still fresh.
    pub fn apply_update(
        &mut self,
        category: DataCategory,
        record: &DataRecord,
        window: Duration,
    ) -> ApplyOutcome {
        let incoming = record.date;

        let latest = match self.data.first_mut() {
            Some(latest) if incoming.duration_since(latest.latest_update()) <= window => latest,
            _ => {
                let mut snapshot = StationDataSnapshot::new(incoming, record.units);
                snapshot.merge_category(category, record);
                self.add_data(snapshot);
                return ApplyOutcome::Replaced;
            }
        };

        let other = category.other();
        let reset_other = latest
            .last_update(other)
            .is_some_and(|last| incoming.duration_since(last) > window);
        if reset_other {
            latest.reset(other);
        }
        latest.merge_category(category, record);

        ApplyOutcome::Merged { reset_other }
    }

    /// Fold every populated category of `record` into the latest snapshot.
    pub fn apply_record(&mut self, record: &DataRecord, window: Duration) {
        for category in DataCategory::ALL {
            if record.has(category) {
                self.apply_update(category, record, window);
            }
        }
    }

    /// Convert all cached data to `to`.
    pub fn convert(&mut self, to: UnitSystem) {
        for snapshot in &mut self.data {
            snapshot.convert(to);
        }
    }
}
