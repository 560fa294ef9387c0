//! Per-station refresh groups.
//!
//! A refresh fans out one fetch per data category. Results land in a shared
//! buffer in whatever order they finish; the group only commits once every
//! sub-fetch has reported. The buffer is committed if at least one category
//! succeeded, otherwise the whole refresh is a failure.

use crate::snapshot::StationDataSnapshot;
use buoy_types::{DataCategory, DataRecord, FetchError, StationId, UnitSystem};

/// Result of a finished refresh group.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// At least one category succeeded.
    Succeeded {
        /// Accumulated data.
        snapshot: StationDataSnapshot,
        /// Categories that failed alongside.
        failed: Vec<(DataCategory, FetchError)>,
    },
    /// Every category failed.
    Failed {
        /// Errors per category, in completion order.
        errors: Vec<(DataCategory, FetchError)>,
    },
}

/// An in-flight refresh for one station.
#[derive(Debug)]
pub struct RefreshGroup {
    station_id: StationId,
    units: UnitSystem,
    outstanding: usize,
    pending: Vec<DataCategory>,
    buffer: Option<StationDataSnapshot>,
    failures: Vec<(DataCategory, FetchError)>,
}

impl RefreshGroup {
    /// Start a group expecting one result per category.
    pub fn new(station_id: StationId, units: UnitSystem, categories: &[DataCategory]) -> Self {
        Self {
            station_id,
            units,
            outstanding: categories.len(),
            pending: categories.to_vec(),
            buffer: None,
            failures: Vec::new(),
        }
    }

    /// Station being refreshed.
    pub fn station_id(&self) -> &StationId {
        &self.station_id
    }

    /// Unit system requested.
    pub fn units(&self) -> UnitSystem {
        self.units
    }

    /// Sub-fetches still outstanding.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Whether every sub-fetch has reported.
    pub fn is_complete(&self) -> bool {
        self.outstanding == 0
    }

    /// Record one sub-fetch result.
    ///
    /// Returns the outcome when this was the last outstanding result.
    /// Results for categories that are not pending are ignored.
    pub fn complete(
        &mut self,
        category: DataCategory,
        result: Result<DataRecord, FetchError>,
    ) -> Option<RefreshOutcome> {
        let Some(pos) = self.pending.iter().position(|c| *c == category) else {
            return None;
        };
        self.pending.swap_remove(pos);

        match result {
            Ok(record) => match &mut self.buffer {
                Some(buffer) => buffer.merge_category(category, &record),
                None => {
                    let mut buffer = StationDataSnapshot::new(record.date, self.units);
                    buffer.merge_category(category, &record);
                    self.buffer = Some(buffer);
                }
            },
            Err(e) => self.failures.push((category, e)),
        }

        self.outstanding -= 1;
        if self.outstanding > 0 {
            return None;
        }

        let failures = std::mem::take(&mut self.failures);
        Some(match self.buffer.take() {
            Some(snapshot) => RefreshOutcome::Succeeded {
                snapshot,
                failed: failures,
            },
            None => RefreshOutcome::Failed { errors: failures },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buoy_types::{Timestamp, WaveData, WeatherData};

    fn record(secs: i64, wave: bool, weather: bool) -> DataRecord {
        DataRecord {
            date: Timestamp::from_secs(secs),
            units: UnitSystem::Metric,
            wave: if wave {
                WaveData {
                    average_period: Some(9.0),
                    ..Default::default()
                }
            } else {
                WaveData::default()
            },
            weather: if weather {
                WeatherData {
                    air_temperature: Some(12.0),
                    ..Default::default()
                }
            } else {
                WeatherData::default()
            },
        }
    }

    fn group() -> RefreshGroup {
        RefreshGroup::new(StationId::new("44097"), UnitSystem::Metric, &DataCategory::ALL)
    }

    #[test]
    fn commits_only_after_last_result() {
        let mut g = group();
        assert_eq!(g.outstanding(), 2);

        assert!(g
            .complete(DataCategory::Weather, Ok(record(100, false, true)))
            .is_none());
        assert!(!g.is_complete());

        let outcome = g.complete(DataCategory::Wave, Ok(record(200, true, false)));
        assert!(g.is_complete());
        match outcome {
            Some(RefreshOutcome::Succeeded { snapshot, failed }) => {
                assert!(failed.is_empty());
                assert!(!snapshot.wave.is_empty());
                assert!(!snapshot.weather.is_empty());
                assert_eq!(snapshot.date, Timestamp::from_secs(100));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn partial_failure_still_commits() {
        let mut g = group();
        g.complete(DataCategory::Wave, Err(FetchError::EmptyResponse));
        let outcome = g.complete(DataCategory::Weather, Ok(record(100, false, true)));

        match outcome {
            Some(RefreshOutcome::Succeeded { snapshot, failed }) => {
                assert!(snapshot.wave.is_empty());
                assert!(!snapshot.weather.is_empty());
                assert_eq!(failed, vec![(DataCategory::Wave, FetchError::EmptyResponse)]);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn all_failures_fail_the_group() {
        let mut g = group();
        g.complete(DataCategory::Wave, Err(FetchError::BadStatus(500)));
        let outcome = g.complete(
            DataCategory::Weather,
            Err(FetchError::Transport("reset".into())),
        );
        match outcome {
            Some(RefreshOutcome::Failed { errors }) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn duplicate_result_is_ignored() {
        let mut g = group();
        g.complete(DataCategory::Wave, Ok(record(100, true, false)));
        assert!(g
            .complete(DataCategory::Wave, Ok(record(100, true, false)))
            .is_none());
        assert_eq!(g.outstanding(), 1);
    }
}
