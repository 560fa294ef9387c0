//! CLI command implementations.

pub mod favorites;
pub mod nearby;
pub mod pinned;
pub mod settings;
pub mod station;

use buoy_core::Station;
use buoy_types::UnitSystem;

/// Distance suffix for a unit system.
pub(crate) fn distance_label(units: UnitSystem) -> &'static str {
    match units {
        UnitSystem::Metric => "km",
        UnitSystem::English => "mi",
    }
}

/// `"44097 Block Island"`, or just the id for unnamed stations.
pub(crate) fn station_title(station: &Station) -> String {
    match &station.location.name {
        Some(name) => format!("{} {}", station.id, name),
        None => station.id.to_string(),
    }
}
