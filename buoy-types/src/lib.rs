//! # buoy-types
//!
//! Data types shared by every BuoyFinder sync crate.
//!
//! This crate provides the foundational types used across the workspace:
//! - [`StationId`], [`Timestamp`] - Identity and time types
//! - [`UnitSystem`], [`Measurement`] - Unit systems and scalar conversion
//! - [`StationRecord`], [`DataRecord`], [`WaveData`], [`WeatherData`] - Records
//!   exchanged with the remote data source
//! - [`FetchError`] - Error taxonomy for remote fetches

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod ids;
mod records;
mod units;

pub use error::FetchError;
pub use ids::{StationId, Timestamp};
pub use records::{
    DataCategory, DataRecord, Location, StationMetadata, StationRecord, Swell, WaveData,
    WeatherData,
};
pub use units::{Measurement, UnitSystem};
