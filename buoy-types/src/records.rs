//! Station and measurement records exchanged with the data source.
//!
//! Measurement fields are grouped by category. A wave fetch fills
//! [`WaveData`], a weather fetch fills [`WeatherData`]; merges and resets
//! always replace a whole group.

use crate::{Measurement, StationId, Timestamp, UnitSystem};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Geographic position of a station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Altitude in meters, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    /// Human-readable place name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Location {
    /// Create a location from coordinates.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
            name: None,
        }
    }

    /// Set the place name.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }
}

/// Descriptive metadata of a station.
///
/// Capability flags are tri-state: absent, true or false.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationMetadata {
    /// Operating organisation.
    #[serde(default)]
    pub owner: Option<String>,
    /// Observation program the station belongs to.
    #[serde(default)]
    pub program: Option<String>,
    /// Platform type (buoy, fixed, ...).
    #[serde(default)]
    pub station_type: Option<String>,
    /// Currently reporting.
    #[serde(default)]
    pub active: Option<bool>,
    /// Reports ocean currents.
    #[serde(default)]
    pub currents: Option<bool>,
    /// Reports water quality.
    #[serde(default)]
    pub water_quality: Option<bool>,
    /// Part of the DART tsunami network.
    #[serde(default)]
    pub dart: Option<bool>,
}

/// A station as returned by the catalog and detail endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationRecord {
    /// Station identifier.
    pub id: StationId,
    /// Position.
    pub location: Location,
    /// Descriptive metadata.
    #[serde(flatten)]
    pub metadata: StationMetadata,
}

/// Measurement category, fetched and merged independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataCategory {
    /// Swell and spectral wave data.
    #[serde(alias = "spectra")]
    Wave,
    /// Wind, pressure, temperatures, visibility and water level.
    Weather,
}

impl DataCategory {
    /// Every category, in fetch order.
    pub const ALL: [DataCategory; 2] = [DataCategory::Wave, DataCategory::Weather];

    /// The category that is not `self`.
    pub fn other(&self) -> Self {
        match self {
            Self::Wave => Self::Weather,
            Self::Weather => Self::Wave,
        }
    }

    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wave => "wave",
            Self::Weather => "weather",
        }
    }
}

impl fmt::Display for DataCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wave" | "spectra" => Ok(Self::Wave),
            "weather" => Ok(Self::Weather),
            other => Err(format!("unknown data category: {}", other)),
        }
    }
}

/// One swell train.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Swell {
    /// Significant height in the swell's unit system.
    pub wave_height: f64,
    /// Period in seconds.
    pub period: f64,
    /// Direction the swell comes from, degrees.
    #[serde(default)]
    pub direction: Option<f64>,
    /// Compass label for the direction, e.g. `"SSE"`.
    #[serde(default)]
    pub compass_direction: Option<String>,
    /// Unit system of `wave_height`.
    #[serde(default)]
    pub units: UnitSystem,
}

impl Swell {
    /// Convert the height into `to` and retag.
    pub fn convert(&mut self, to: UnitSystem) {
        self.wave_height = self.units.convert(Measurement::Length, self.wave_height, to);
        self.units = to;
    }

    /// Short form: `"1.2 m @ 8.0 s SSE"`.
    pub fn simple_description(&self) -> String {
        let mut out = format!(
            "{:.1} {} @ {:.1} s",
            self.wave_height,
            self.units.label(Measurement::Length),
            self.period
        );
        if let Some(compass) = &self.compass_direction {
            out.push(' ');
            out.push_str(compass);
        }
        out
    }

    /// Long form including the direction in degrees.
    pub fn detailed_description(&self) -> String {
        let mut out = format!(
            "{:.1} {} @ {:.1} s",
            self.wave_height,
            self.units.label(Measurement::Length),
            self.period
        );
        if let Some(direction) = self.direction {
            out.push_str(&format!(
                " {:3.0}{}",
                direction,
                self.units.label(Measurement::Direction)
            ));
        }
        if let Some(compass) = &self.compass_direction {
            out.push(' ');
            out.push_str(compass);
        }
        out
    }
}

/// Wave category field group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaveData {
    /// Combined sea state.
    #[serde(default)]
    pub summary: Option<Swell>,
    /// Individual swell trains, largest first.
    #[serde(default)]
    pub components: Vec<Swell>,
    /// Steepness label, e.g. `"AVERAGE"`.
    #[serde(default)]
    pub steepness: Option<String>,
    /// Average period in seconds.
    #[serde(default)]
    pub average_period: Option<f64>,
    /// URL of the directional spectra plot.
    #[serde(default)]
    pub directional_spectra_plot: Option<String>,
    /// URL of the spectral distribution plot.
    #[serde(default)]
    pub spectral_distribution_plot: Option<String>,
}

impl WaveData {
    /// Whether no field is populated.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Convert every swell to `to`.
    pub fn convert(&mut self, to: UnitSystem) {
        if let Some(summary) = self.summary.as_mut() {
            summary.convert(to);
        }
        for swell in &mut self.components {
            swell.convert(to);
        }
    }
}

/// Weather category field group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherData {
    /// Wind direction in degrees.
    #[serde(default)]
    pub wind_direction: Option<f64>,
    /// Compass label for the wind direction.
    #[serde(default)]
    pub wind_compass_direction: Option<String>,
    /// Sustained wind speed.
    #[serde(default)]
    pub wind_speed: Option<f64>,
    /// Wind gust.
    #[serde(default)]
    pub wind_gust: Option<f64>,
    /// Sea-level pressure.
    #[serde(default)]
    pub pressure: Option<f64>,
    /// Pressure change over the last three hours.
    #[serde(default)]
    pub pressure_tendency: Option<f64>,
    /// Air temperature.
    #[serde(default)]
    pub air_temperature: Option<f64>,
    /// Water temperature.
    #[serde(default)]
    pub water_temperature: Option<f64>,
    /// Dewpoint temperature.
    #[serde(default)]
    pub dewpoint_temperature: Option<f64>,
    /// Visibility in nautical miles.
    #[serde(default)]
    pub visibility: Option<f64>,
    /// Water level (tide).
    #[serde(default)]
    pub water_level: Option<f64>,
}

impl WeatherData {
    /// Whether no field is populated.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Convert every populated scalar from `from` into `to`.
    pub fn convert(&mut self, from: UnitSystem, to: UnitSystem) {
        from.convert_opt(Measurement::Speed, &mut self.wind_speed, to);
        from.convert_opt(Measurement::Speed, &mut self.wind_gust, to);
        from.convert_opt(Measurement::Pressure, &mut self.pressure, to);
        from.convert_opt(Measurement::Pressure, &mut self.pressure_tendency, to);
        from.convert_opt(Measurement::Temperature, &mut self.air_temperature, to);
        from.convert_opt(Measurement::Temperature, &mut self.water_temperature, to);
        from.convert_opt(Measurement::Temperature, &mut self.dewpoint_temperature, to);
        from.convert_opt(Measurement::Length, &mut self.water_level, to);
        from.convert_opt(Measurement::Visibility, &mut self.visibility, to);
    }
}

/// A data response for one station.
///
/// A single-category fetch leaves the other group empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRecord {
    /// Observation time.
    pub date: Timestamp,
    /// Unit system of every scalar in the record.
    pub units: UnitSystem,
    /// Wave fields.
    #[serde(default)]
    pub wave: WaveData,
    /// Weather fields.
    #[serde(default)]
    pub weather: WeatherData,
}

impl DataRecord {
    /// Whether the given category has any populated field.
    pub fn has(&self, category: DataCategory) -> bool {
        match category {
            DataCategory::Wave => !self.wave.is_empty(),
            DataCategory::Weather => !self.weather.is_empty(),
        }
    }
}
