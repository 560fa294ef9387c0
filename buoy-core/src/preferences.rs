//! User preferences and the remote/local reconciliation rule.
//!
//! Preferences exist in two places: the device-local store and, when a user
//! is signed in, a remote per-user record. [`Preferences::merge`] folds a
//! remote [`PreferenceSource`] into the local value. Scalar fields take the
//! remote value when present. Favorites follow a two-way diff: new remote
//! ids are appended (if the catalog knows them), then local ids the remote
//! no longer lists are dropped.

use buoy_types::{StationId, UnitSystem};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors from preference mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreferencesError {
    /// A favorites index was outside the list.
    #[error("favorite index {index} out of range (len {len})")]
    IndexOutOfRange {
        /// Offending index.
        index: usize,
        /// Length of the favorites list.
        len: usize,
    },

    /// A string did not name a known value.
    #[error("unknown {kind}: {value}")]
    UnknownValue {
        /// What was being parsed.
        kind: &'static str,
        /// The rejected input.
        value: String,
    },
}

/// Which screen the app opens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InitialView {
    /// Map of nearby stations.
    #[default]
    Explore,
    /// The favorites list.
    Favorites,
    /// The default station's detail view.
    DefaultStation,
}

impl InitialView {
    /// All views, in menu order.
    pub const ALL: [InitialView; 3] = [
        InitialView::Explore,
        InitialView::Favorites,
        InitialView::DefaultStation,
    ];

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            InitialView::Explore => "explore",
            InitialView::Favorites => "favorites",
            InitialView::DefaultStation => "default-station",
        }
    }
}

impl fmt::Display for InitialView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InitialView {
    type Err = PreferencesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| PreferencesError::UnknownValue {
                kind: "initial view",
                value: s.to_string(),
            })
    }
}

/// The measurement shown on map markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayVariable {
    /// Wave summary.
    #[default]
    Waves,
    /// Wind speed and direction.
    Wind,
    /// Barometric pressure.
    Pressure,
    /// Air temperature.
    AirTemperature,
    /// Water temperature.
    WaterTemperature,
    /// Dewpoint.
    Dewpoint,
    /// Visibility.
    Visibility,
    /// Water level.
    WaterLevel,
}

impl DisplayVariable {
    /// All variables, in menu order.
    pub const ALL: [DisplayVariable; 8] = [
        DisplayVariable::Waves,
        DisplayVariable::Wind,
        DisplayVariable::Pressure,
        DisplayVariable::AirTemperature,
        DisplayVariable::WaterTemperature,
        DisplayVariable::Dewpoint,
        DisplayVariable::Visibility,
        DisplayVariable::WaterLevel,
    ];

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayVariable::Waves => "waves",
            DisplayVariable::Wind => "wind",
            DisplayVariable::Pressure => "pressure",
            DisplayVariable::AirTemperature => "air-temperature",
            DisplayVariable::WaterTemperature => "water-temperature",
            DisplayVariable::Dewpoint => "dewpoint",
            DisplayVariable::Visibility => "visibility",
            DisplayVariable::WaterLevel => "water-level",
        }
    }
}

impl fmt::Display for DisplayVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayVariable {
    type Err = PreferencesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| PreferencesError::UnknownValue {
                kind: "display variable",
                value: s.to_string(),
            })
    }
}

/// A partial preference record, as read from a remote store.
///
/// Absent fields leave the local value untouched. An empty default station
/// string means "no default".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceSource {
    /// Unit system.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<UnitSystem>,
    /// Initial view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_view: Option<InitialView>,
    /// Default station id, empty for none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_station: Option<String>,
    /// Ordered favorite ids.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorite_stations: Option<Vec<StationId>>,
    /// Map marker variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_variable: Option<DisplayVariable>,
}

impl PreferenceSource {
    /// True if no field is present.
    pub fn is_empty(&self) -> bool {
        self.units.is_none()
            && self.initial_view.is_none()
            && self.default_station.is_none()
            && self.favorite_stations.is_none()
            && self.display_variable.is_none()
    }
}

/// What a merge changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Whether any local value changed.
    pub changed: bool,
    /// Remote favorites skipped because the catalog does not know them.
    pub dropped: Vec<StationId>,
}

/// The user's preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Unit system for display and fetching.
    #[serde(default)]
    pub units: UnitSystem,
    /// Screen to open on launch.
    #[serde(default)]
    pub initial_view: InitialView,
    /// Station opened by [`InitialView::DefaultStation`].
    #[serde(default)]
    pub default_station: Option<StationId>,
    /// Ordered favorites, no duplicates.
    #[serde(default)]
    pub favorites: Vec<StationId>,
    /// Map marker variable.
    #[serde(default)]
    pub display_variable: DisplayVariable,
}

impl Preferences {
    /// Whether `id` is a favorite.
    pub fn is_favorite(&self, id: &StationId) -> bool {
        self.favorites.contains(id)
    }

    /// Append `id` to the favorites. Returns false if already present.
    pub fn add_favorite(&mut self, id: StationId) -> bool {
        if self.is_favorite(&id) {
            return false;
        }
        self.favorites.push(id);
        true
    }

    /// Remove `id` from the favorites. Returns false if it was not present.
    pub fn remove_favorite(&mut self, id: &StationId) -> bool {
        let before = self.favorites.len();
        self.favorites.retain(|f| f != id);
        self.favorites.len() != before
    }

    /// Move the favorite at `from` to `to`, shifting the rest.
    pub fn move_favorite(&mut self, from: usize, to: usize) -> Result<(), PreferencesError> {
        let len = self.favorites.len();
        for index in [from, to] {
            if index >= len {
                return Err(PreferencesError::IndexOutOfRange { index, len });
            }
        }
        let id = self.favorites.remove(from);
        self.favorites.insert(to, id);
        Ok(())
    }

    /// Full record for writing to a remote store.
    pub fn to_source(&self) -> PreferenceSource {
        PreferenceSource {
            units: Some(self.units),
            initial_view: Some(self.initial_view),
            default_station: Some(
                self.default_station
                    .as_ref()
                    .map(|id| id.as_str().to_string())
                    .unwrap_or_default(),
            ),
            favorite_stations: Some(self.favorites.clone()),
            display_variable: Some(self.display_variable),
        }
    }

    /// Fold `source` into these preferences.
    ///
    /// `resolve` reports whether the catalog knows a station. Remote
    /// favorites it rejects are skipped and listed in the report.
    pub fn merge(
        &mut self,
        source: &PreferenceSource,
        resolve: impl Fn(&StationId) -> bool,
    ) -> MergeReport {
        let mut report = MergeReport::default();

        if let Some(units) = source.units {
            report.changed |= self.units != units;
            self.units = units;
        }
        if let Some(view) = source.initial_view {
            report.changed |= self.initial_view != view;
            self.initial_view = view;
        }
        if let Some(default) = &source.default_station {
            let default = (!default.is_empty()).then(|| StationId::new(default.as_str()));
            report.changed |= self.default_station != default;
            self.default_station = default;
        }
        if let Some(variable) = source.display_variable {
            report.changed |= self.display_variable != variable;
            self.display_variable = variable;
        }

        if let Some(incoming) = &source.favorite_stations {
            for id in incoming {
                if self.is_favorite(id) {
                    continue;
                }
                if resolve(id) {
                    self.favorites.push(id.clone());
                    report.changed = true;
                } else if !report.dropped.contains(id) {
                    report.dropped.push(id.clone());
                }
            }

            let before = self.favorites.len();
            self.favorites.retain(|id| incoming.contains(id));
            report.changed |= self.favorites.len() != before;
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> Vec<StationId> {
        list.iter().map(|s| StationId::new(*s)).collect()
    }

    #[test]
    fn defaults() {
        let prefs = Preferences::default();
        assert_eq!(prefs.units, UnitSystem::Metric);
        assert_eq!(prefs.initial_view, InitialView::Explore);
        assert_eq!(prefs.default_station, None);
        assert!(prefs.favorites.is_empty());
        assert_eq!(prefs.display_variable, DisplayVariable::Waves);
    }

    #[test]
    fn add_favorite_is_idempotent() {
        let mut prefs = Preferences::default();
        assert!(prefs.add_favorite(StationId::new("44097")));
        assert!(!prefs.add_favorite(StationId::new("44097")));
        assert_eq!(prefs.favorites, ids(&["44097"]));
    }

    #[test]
    fn remove_missing_favorite_is_noop() {
        let mut prefs = Preferences::default();
        prefs.add_favorite(StationId::new("a"));
        assert!(!prefs.remove_favorite(&StationId::new("b")));
        assert!(prefs.remove_favorite(&StationId::new("a")));
        assert!(prefs.favorites.is_empty());
    }

    #[test]
    fn move_favorite_shifts_others() {
        let mut prefs = Preferences {
            favorites: ids(&["a", "b", "c", "d"]),
            ..Default::default()
        };
        prefs.move_favorite(0, 2).unwrap();
        assert_eq!(prefs.favorites, ids(&["b", "c", "a", "d"]));
        prefs.move_favorite(3, 0).unwrap();
        assert_eq!(prefs.favorites, ids(&["d", "b", "c", "a"]));
    }

    #[test]
    fn move_favorite_out_of_range() {
        let mut prefs = Preferences {
            favorites: ids(&["a", "b"]),
            ..Default::default()
        };
        let err = prefs.move_favorite(0, 2).unwrap_err();
        assert_eq!(err, PreferencesError::IndexOutOfRange { index: 2, len: 2 });
        assert_eq!(prefs.favorites, ids(&["a", "b"]));
    }

    #[test]
    fn merge_two_way_diff_drops_unknown() {
        let mut prefs = Preferences {
            favorites: ids(&["A", "B"]),
            ..Default::default()
        };
        let source = PreferenceSource {
            favorite_stations: Some(ids(&["B", "C", "D"])),
            ..Default::default()
        };

        let report = prefs.merge(&source, |id| id.as_str() != "D");

        assert_eq!(prefs.favorites, ids(&["B", "C"]));
        assert!(report.changed);
        assert_eq!(report.dropped, ids(&["D"]));
    }

    #[test]
    fn merge_identical_source_reports_unchanged() {
        let mut prefs = Preferences {
            units: UnitSystem::English,
            favorites: ids(&["A"]),
            default_station: Some(StationId::new("A")),
            ..Default::default()
        };
        let source = prefs.to_source();
        let report = prefs.clone().merge(&source, |_| true);
        assert!(!report.changed);
        let again = prefs.merge(&source, |_| true);
        assert!(!again.changed);
    }

    #[test]
    fn merge_absent_fields_keep_local() {
        let mut prefs = Preferences {
            units: UnitSystem::English,
            initial_view: InitialView::Favorites,
            favorites: ids(&["A"]),
            ..Default::default()
        };
        let report = prefs.merge(&PreferenceSource::default(), |_| true);
        assert!(!report.changed);
        assert_eq!(prefs.units, UnitSystem::English);
        assert_eq!(prefs.favorites, ids(&["A"]));
    }

    #[test]
    fn merge_scalar_fields() {
        let mut prefs = Preferences {
            default_station: Some(StationId::new("A")),
            ..Default::default()
        };
        let source = PreferenceSource {
            units: Some(UnitSystem::English),
            initial_view: Some(InitialView::DefaultStation),
            default_station: Some(String::new()),
            display_variable: Some(DisplayVariable::Wind),
            ..Default::default()
        };
        let report = prefs.merge(&source, |_| true);
        assert!(report.changed);
        assert_eq!(prefs.units, UnitSystem::English);
        assert_eq!(prefs.initial_view, InitialView::DefaultStation);
        assert_eq!(prefs.default_station, None);
        assert_eq!(prefs.display_variable, DisplayVariable::Wind);
    }

    #[test]
    fn source_json_omits_absent_fields() {
        let source = PreferenceSource {
            units: Some(UnitSystem::English),
            ..Default::default()
        };
        let json = serde_json::to_string(&source).unwrap();
        assert_eq!(json, r#"{"units":"english"}"#);
        assert!(PreferenceSource::default().is_empty());
    }

    #[test]
    fn enum_names_parse() {
        assert_eq!(
            "default-station".parse::<InitialView>().unwrap(),
            InitialView::DefaultStation
        );
        assert_eq!(
            "Water-Temperature".parse::<DisplayVariable>().unwrap(),
            DisplayVariable::WaterTemperature
        );
        assert!("map".parse::<InitialView>().is_err());
        for v in DisplayVariable::ALL {
            let json = serde_json::to_string(&v).unwrap();
            assert_eq!(json, format!("\"{}\"", v.as_str()));
        }
    }
}
