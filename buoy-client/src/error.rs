//! Error types for the client stores.

use crate::remote::RemoteError;
use crate::storage::StorageError;
use buoy_core::PreferencesError;
use buoy_types::{FetchError, StationId};
use thiserror::Error;

/// Main error type for client store operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A fetch from the data source failed.
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Local persistence failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The remote preference store failed.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// A preference mutation was rejected.
    #[error("preferences error: {0}")]
    Preferences(#[from] PreferencesError),

    /// The station is not in the catalog.
    #[error("unknown station: {0}")]
    UnknownStation(StationId),

    /// The operation needs a signed-in user.
    #[error("not signed in")]
    NotSignedIn,
}
