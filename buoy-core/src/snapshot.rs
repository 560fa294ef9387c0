//! The merged "latest" dataset for one station.
//!
//! A snapshot carries both measurement categories with their own
//! last-update timestamps, since wave and weather data arrive on
//! independent schedules. The unit tag governs every populated scalar.

use crate::preferences::DisplayVariable;
use buoy_types::{DataCategory, DataRecord, Measurement, Timestamp, UnitSystem, WaveData, WeatherData};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Latest merged data for a station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationDataSnapshot {
    /// When the snapshot was started.
    pub date: Timestamp,
    /// Unit system of every scalar in the snapshot.
    pub units: UnitSystem,
    /// When wave fields were last written.
    #[serde(default)]
    pub last_wave_update: Option<Timestamp>,
    /// When weather fields were last written.
    #[serde(default)]
    pub last_weather_update: Option<Timestamp>,
    /// Wave fields.
    #[serde(default)]
    pub wave: WaveData,
    /// Weather fields.
    #[serde(default)]
    pub weather: WeatherData,
}

impl StationDataSnapshot {
    /// Create an empty snapshot.
    pub fn new(date: Timestamp, units: UnitSystem) -> Self {
        Self {
            date,
            units,
            last_wave_update: None,
            last_weather_update: None,
            wave: WaveData::default(),
            weather: WeatherData::default(),
        }
    }

    /// Build a snapshot from a full data record.
    ///
    /// Only categories with populated fields get a last-update timestamp.
    pub fn from_record(record: &DataRecord) -> Self {
        let mut snapshot = Self::new(record.date, record.units);
        for category in DataCategory::ALL {
            if record.has(category) {
                snapshot.merge_category(category, record);
            }
        }
        snapshot
    }

    /// Last update time of a category.
    pub fn last_update(&self, category: DataCategory) -> Option<Timestamp> {
        match category {
            DataCategory::Wave => self.last_wave_update,
            DataCategory::Weather => self.last_weather_update,
        }
    }

    /// The most recent write to any category, or the snapshot date.
    pub fn latest_update(&self) -> Timestamp {
        [self.last_wave_update, self.last_weather_update]
            .into_iter()
            .flatten()
            .max()
            .unwrap_or(self.date)
    }

    /// Whether both categories are empty.
    pub fn is_empty(&self) -> bool {
        self.wave.is_empty() && self.weather.is_empty()
    }

    /// Replace one category's field group with the record's.
    ///
    /// Never a per-field union: absent fields in the record clear the
    /// snapshot's fields. Record values are converted to the snapshot's
    /// units first.
    pub fn merge_category(&mut self, category: DataCategory, record: &DataRecord) {
        match category {
            DataCategory::Wave => {
                let mut wave = record.wave.clone();
                if record.units != self.units {
                    wave.convert(self.units);
                }
                self.wave = wave;
                self.last_wave_update = Some(record.date);
            }
            DataCategory::Weather => {
                let mut weather = record.weather.clone();
                weather.convert(record.units, self.units);
                self.weather = weather;
                self.last_weather_update = Some(record.date);
            }
        }
    }

    /// Clear one category's fields and timestamp.
    pub fn reset(&mut self, category: DataCategory) {
        match category {
            DataCategory::Wave => {
                self.wave = WaveData::default();
                self.last_wave_update = None;
            }
            DataCategory::Weather => {
                self.weather = WeatherData::default();
                self.last_weather_update = None;
            }
        }
    }

    /// Convert every populated scalar to `to` and retag.
    pub fn convert(&mut self, to: UnitSystem) {
        if self.units == to {
            return;
        }
        self.wave.convert(to);
        self.weather.convert(self.units, to);
        self.units = to;
    }

    /// `RISING`, `FALLING` or `STEADY`; `None` without a tendency reading.
    pub fn pressure_tendency_label(&self) -> Option<&'static str> {
        let tendency = self.weather.pressure_tendency?;
        Some(if tendency > 0.0 {
            "RISING"
        } else if tendency < 0.0 {
            "FALLING"
        } else {
            "STEADY"
        })
    }

    /// `"12 (Gust 18) m/s SW"`; needs speed and gust.
    pub fn wind_summary(&self) -> Option<String> {
        let speed = self.weather.wind_speed?;
        let gust = self.weather.wind_gust?;
        let mut out = format!(
            "{:.0} (Gust {:.0}) {}",
            speed,
            gust,
            self.units.label(Measurement::Speed)
        );
        if let Some(compass) = &self.weather.wind_compass_direction {
            out.push(' ');
            out.push_str(compass);
        }
        Some(out)
    }

    /// `"1013.20 hPa RISING"`.
    pub fn pressure_summary(&self) -> Option<String> {
        let pressure = self.weather.pressure?;
        let mut out = format!("{:.2} {}", pressure, self.units.label(Measurement::Pressure));
        if let Some(label) = self.pressure_tendency_label() {
            out.push(' ');
            out.push_str(label);
        }
        Some(out)
    }

    /// Every populated weather variable, formatted with its unit suffix.
    pub fn weather_display(&self) -> BTreeMap<&'static str, String> {
        let mut data = BTreeMap::new();
        let w = &self.weather;
        let units = self.units;

        if let Some(speed) = w.wind_speed {
            let mut wind = format!("{:.1} {}", speed, units.label(Measurement::Speed));
            if let Some(dir) = w.wind_direction {
                wind.push_str(&format!(" {:.0}{}", dir, units.label(Measurement::Direction)));
            }
            if let Some(compass) = &w.wind_compass_direction {
                wind.push(' ');
                wind.push_str(compass);
            }
            data.insert("Wind", wind);
        }
        if let Some(gust) = w.wind_gust {
            data.insert("Wind Gust", format_scalar(gust, 1, units, Measurement::Speed));
        }
        if let Some(t) = w.water_temperature {
            data.insert("Water Temperature", format_scalar(t, 2, units, Measurement::Temperature));
        }
        if let Some(t) = w.air_temperature {
            data.insert("Air Temperature", format_scalar(t, 2, units, Measurement::Temperature));
        }
        if let Some(t) = w.dewpoint_temperature {
            data.insert("Dewpoint", format_scalar(t, 2, units, Measurement::Temperature));
        }
        if let Some(summary) = self.pressure_summary() {
            data.insert("Pressure", summary);
        }
        if let Some(v) = w.visibility {
            data.insert("Visibility", format_scalar(v, 1, units, Measurement::Visibility));
        }
        if let Some(level) = w.water_level {
            data.insert("Water Level", format_scalar(level, 1, units, Measurement::Length));
        }

        data
    }

    /// One-line value for the widget's chosen variable.
    pub fn display_value(&self, variable: DisplayVariable) -> Option<String> {
        let w = &self.weather;
        let units = self.units;
        match variable {
            DisplayVariable::Waves => self.wave.summary.as_ref().map(|s| s.simple_description()),
            DisplayVariable::Wind => self.wind_summary().or_else(|| {
                w.wind_speed
                    .map(|s| format_scalar(s, 1, units, Measurement::Speed))
            }),
            DisplayVariable::Pressure => self.pressure_summary(),
            DisplayVariable::AirTemperature => w
                .air_temperature
                .map(|t| format_scalar(t, 1, units, Measurement::Temperature)),
            DisplayVariable::WaterTemperature => w
                .water_temperature
                .map(|t| format_scalar(t, 1, units, Measurement::Temperature)),
            DisplayVariable::Dewpoint => w
                .dewpoint_temperature
                .map(|t| format_scalar(t, 1, units, Measurement::Temperature)),
            DisplayVariable::Visibility => w
                .visibility
                .map(|v| format_scalar(v, 1, units, Measurement::Visibility)),
            DisplayVariable::WaterLevel => w
                .water_level
                .map(|l| format_scalar(l, 1, units, Measurement::Length)),
        }
    }
}

fn format_scalar(value: f64, precision: usize, units: UnitSystem, measurement: Measurement) -> String {
    format!("{:.*} {}", precision, value, units.label(measurement))
}
