//! Unit systems and scalar conversion.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const FEET_PER_METER: f64 = 3.28;
const MPH_PER_METER_PER_SECOND: f64 = 2.237;
const HPA_PER_INCH_MERCURY: f64 = 33.8638;

/// The unit system a measurement is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    /// Meters, meters per second, Celsius, hectopascals.
    #[default]
    Metric,
    /// Feet, miles per hour, Fahrenheit, inches of mercury.
    English,
}

/// The kind of quantity a scalar measures.
///
/// Determines which conversion applies when the unit system changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Measurement {
    /// Wave height, water level.
    Length,
    /// Wind speed and gust.
    Speed,
    /// Air, water and dewpoint temperature.
    Temperature,
    /// Pressure and pressure tendency.
    Pressure,
    /// Visibility, always nautical miles.
    Visibility,
    /// Compass direction in degrees.
    Direction,
}

impl UnitSystem {
    /// The lowercase name used in persisted preferences and fetch requests.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::English => "english",
        }
    }

    /// Display suffix for a measurement in this unit system.
    pub fn label(&self, measurement: Measurement) -> &'static str {
        match (measurement, self) {
            (Measurement::Length, Self::Metric) => "m",
            (Measurement::Length, Self::English) => "ft",
            (Measurement::Speed, Self::Metric) => "m/s",
            (Measurement::Speed, Self::English) => "mph",
            (Measurement::Temperature, Self::Metric) => "°C",
            (Measurement::Temperature, Self::English) => "°F",
            (Measurement::Pressure, Self::Metric) => "hPa",
            (Measurement::Pressure, Self::English) => "inHg",
            (Measurement::Visibility, _) => "nmi",
            (Measurement::Direction, _) => "°",
        }
    }

    /// Mean Earth radius in this system's distance unit (km or mi).
    pub fn earth_radius(&self) -> f64 {
        match self {
            Self::Metric => 6373.0,
            Self::English => 3961.0,
        }
    }

    /// Convert `value` of the given measurement from `self` into `to`.
    ///
    /// Identity when both systems match or the measurement has no unit
    /// dependence (visibility, direction).
    pub fn convert(&self, measurement: Measurement, value: f64, to: UnitSystem) -> f64 {
        if *self == to {
            return value;
        }

        match (measurement, to) {
            (Measurement::Length, Self::English) => value * FEET_PER_METER,
            (Measurement::Length, Self::Metric) => value / FEET_PER_METER,
            (Measurement::Speed, Self::English) => value * MPH_PER_METER_PER_SECOND,
            (Measurement::Speed, Self::Metric) => value / MPH_PER_METER_PER_SECOND,
            (Measurement::Temperature, Self::English) => value * (9.0 / 5.0) + 32.0,
            (Measurement::Temperature, Self::Metric) => (value - 32.0) * (5.0 / 9.0),
            (Measurement::Pressure, Self::English) => value / HPA_PER_INCH_MERCURY,
            (Measurement::Pressure, Self::Metric) => value * HPA_PER_INCH_MERCURY,
            (Measurement::Visibility, _) | (Measurement::Direction, _) => value,
        }
    }

    /// Convert an optional value in place.
    pub fn convert_opt(&self, measurement: Measurement, value: &mut Option<f64>, to: UnitSystem) {
        if let Some(v) = value.as_mut() {
            *v = self.convert(measurement, *v, to);
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnitSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "metric" => Ok(Self::Metric),
            "english" | "imperial" => Ok(Self::English),
            other => Err(format!("unknown unit system: {}", other)),
        }
    }
}
