//! Typed store events.
//!
//! Each store owns a `tokio::sync::broadcast` channel. Subscribers that fall
//! behind see `RecvError::Lagged` and should re-read state from the store.

use buoy_types::{FetchError, StationId};

/// Events published by the station directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryEvent {
    /// A new catalog replaced the old one.
    CatalogUpdated,
    /// Loading the catalog failed; the old one is kept.
    CatalogUpdateFailed(FetchError),
    /// A refresh group opened for the station.
    RefreshStarted(StationId),
    /// Fresh data was committed for the station.
    DataUpdated(StationId),
    /// Every sub-fetch of the station's refresh failed.
    RefreshFailed(StationId),
    /// The station's next scheduled update time changed.
    NextUpdateTimeUpdated(StationId),
}

impl DirectoryEvent {
    /// Station the event is about, if any.
    pub fn station_id(&self) -> Option<&StationId> {
        match self {
            DirectoryEvent::CatalogUpdated | DirectoryEvent::CatalogUpdateFailed(_) => None,
            DirectoryEvent::RefreshStarted(id)
            | DirectoryEvent::DataUpdated(id)
            | DirectoryEvent::RefreshFailed(id)
            | DirectoryEvent::NextUpdateTimeUpdated(id) => Some(id),
        }
    }

    /// Whether this event ends a refresh group.
    pub fn is_refresh_terminal(&self) -> bool {
        matches!(
            self,
            DirectoryEvent::DataUpdated(_) | DirectoryEvent::RefreshFailed(_)
        )
    }
}

/// Events published by the settings store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsEvent {
    /// One or more preferences changed.
    Changed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn station_id_and_terminal() {
        let id = StationId::new("44097");
        assert_eq!(DirectoryEvent::DataUpdated(id.clone()).station_id(), Some(&id));
        assert_eq!(DirectoryEvent::CatalogUpdated.station_id(), None);
        assert!(DirectoryEvent::RefreshFailed(id.clone()).is_refresh_terminal());
        assert!(!DirectoryEvent::RefreshStarted(id).is_refresh_terminal());
    }
}
