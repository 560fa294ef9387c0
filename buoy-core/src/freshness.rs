//! Freshness tracking for station data.
//!
//! A station needs a refresh when it was never refreshed, when its last
//! refresh is older than the freshness window, or when it was refreshed in a
//! different unit system. The tracker only records successful refreshes;
//! a failed refresh leaves the previous stamp in place.

use buoy_types::{StationId, Timestamp, UnitSystem};
use std::collections::HashMap;
use std::time::Duration;

/// Data older than this is refetched on demand.
pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_secs(30 * 60);

/// Readings further apart than this are not combined into one snapshot.
pub const DEFAULT_COALESCING_WINDOW: Duration = Duration::from_secs(60 * 60);

/// True if more than `window` has passed between `last` and `now`.
pub fn is_stale(last: Timestamp, now: Timestamp, window: Duration) -> bool {
    now.duration_since(last) > window
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    at: Timestamp,
    units: UnitSystem,
}

/// Last successful refresh per station.
#[derive(Debug, Clone)]
pub struct FreshnessTracker {
    window: Duration,
    entries: HashMap<StationId, Entry>,
}

impl Default for FreshnessTracker {
    fn default() -> Self {
        Self::new(DEFAULT_FRESHNESS_WINDOW)
    }
}

impl FreshnessTracker {
    /// Create a tracker with the given freshness window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            entries: HashMap::new(),
        }
    }

    /// The freshness window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Whether `id` should be fetched again for `units` at `now`.
    pub fn needs_refresh(&self, id: &StationId, units: UnitSystem, now: Timestamp) -> bool {
        match self.entries.get(id) {
            None => true,
            Some(entry) => entry.units != units || is_stale(entry.at, now, self.window),
        }
    }

    /// Record a successful refresh.
    pub fn record_success(&mut self, id: StationId, units: UnitSystem, at: Timestamp) {
        self.entries.insert(id, Entry { at, units });
    }

    /// Time of the last successful refresh.
    pub fn last_refresh(&self, id: &StationId) -> Option<Timestamp> {
        self.entries.get(id).map(|e| e.at)
    }

    /// Drop the stamp for `id`, forcing the next request to fetch.
    pub fn forget(&mut self, id: &StationId) {
        self.entries.remove(id);
    }

    /// Drop every stamp.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: i64 = 1_700_000_000;

    #[test]
    fn stale_is_strict() {
        let t0 = Timestamp::from_secs(T0);
        let window = Duration::from_secs(1800);
        assert!(!is_stale(t0, t0.plus(window), window));
        assert!(is_stale(t0, t0.plus(window + Duration::from_secs(1)), window));
    }

    #[test]
    fn unknown_station_needs_refresh() {
        let tracker = FreshnessTracker::default();
        assert!(tracker.needs_refresh(
            &StationId::new("a"),
            UnitSystem::Metric,
            Timestamp::from_secs(T0)
        ));
    }

    #[test]
    fn fresh_within_window() {
        let mut tracker = FreshnessTracker::default();
        let id = StationId::new("a");
        let t0 = Timestamp::from_secs(T0);
        tracker.record_success(id.clone(), UnitSystem::Metric, t0);

        let ten_min = t0.plus(Duration::from_secs(600));
        assert!(!tracker.needs_refresh(&id, UnitSystem::Metric, ten_min));

        let forty_min = t0.plus(Duration::from_secs(2400));
        assert!(tracker.needs_refresh(&id, UnitSystem::Metric, forty_min));
    }

    #[test]
    fn unit_change_forces_refresh() {
        let mut tracker = FreshnessTracker::default();
        let id = StationId::new("a");
        let t0 = Timestamp::from_secs(T0);
        tracker.record_success(id.clone(), UnitSystem::Metric, t0);
        assert!(tracker.needs_refresh(&id, UnitSystem::English, t0));
    }

    #[test]
    fn forget_and_clear() {
        let mut tracker = FreshnessTracker::new(Duration::from_secs(60));
        let t0 = Timestamp::from_secs(T0);
        tracker.record_success(StationId::new("a"), UnitSystem::Metric, t0);
        tracker.record_success(StationId::new("b"), UnitSystem::Metric, t0);

        tracker.forget(&StationId::new("a"));
        assert_eq!(tracker.last_refresh(&StationId::new("a")), None);
        assert_eq!(tracker.last_refresh(&StationId::new("b")), Some(t0));

        tracker.clear();
        assert!(tracker.needs_refresh(&StationId::new("b"), UnitSystem::Metric, t0));
    }
}
