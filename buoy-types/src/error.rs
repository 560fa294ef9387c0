//! Error types for remote fetches.

use crate::StationId;
use thiserror::Error;

/// Errors surfaced by a remote data source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connection failed or timed out
    #[error("transport error: {0}")]
    Transport(String),

    /// The response carried no body
    #[error("empty response")]
    EmptyResponse,

    /// The service answered with a non-success status code
    #[error("bad status: {0}")]
    BadStatus(u16),

    /// The payload could not be decoded
    #[error("decode error: {0}")]
    Decode(String),

    /// The station id does not resolve against the catalog
    #[error("unknown station: {0}")]
    UnknownStation(StationId),
}

impl FetchError {
    /// Whether retrying later may succeed.
    ///
    /// Decode and unknown-station failures are permanent for the same input.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::EmptyResponse | Self::BadStatus(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = FetchError::BadStatus(503);
        assert_eq!(err.to_string(), "bad status: 503");

        let err = FetchError::UnknownStation(StationId::new("44097"));
        assert_eq!(err.to_string(), "unknown station: 44097");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FetchError>();
    }

    #[test]
    fn transient_classification() {
        assert!(FetchError::Transport("timeout".into()).is_transient());
        assert!(FetchError::BadStatus(500).is_transient());
        assert!(!FetchError::Decode("bad json".into()).is_transient());
        assert!(!FetchError::UnknownStation(StationId::new("x")).is_transient());
    }
}
