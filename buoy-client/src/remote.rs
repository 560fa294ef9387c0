//! Remote per-user preference documents.
//!
//! While a user is signed in, their preferences live in a remote document
//! keyed by [`UserId`]. The store offers partial writes and a live
//! subscription: the receiver holds the current document immediately and is
//! notified after every change.

use async_trait::async_trait;
use buoy_core::PreferenceSource;
use dashmap::mapref::one::Ref;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;

/// Identifier of a signed-in user.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap a user id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Remote store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The backend could not be reached.
    #[error("remote unavailable: {0}")]
    Unavailable(String),

    /// The backend rejected the request.
    #[error("remote rejected request: {0}")]
    Rejected(String),
}

/// Trait for remote per-user preference backends.
#[async_trait]
pub trait RemotePreferenceStore: Send + Sync {
    /// Read the user's document. A user without one gets an empty document.
    async fn fetch(&self, user: &UserId) -> Result<PreferenceSource, RemoteError>;

    /// Write the present fields of `patch` into the user's document.
    async fn update(&self, user: &UserId, patch: PreferenceSource) -> Result<(), RemoteError>;

    /// Delete the user's document and end its subscriptions.
    async fn delete(&self, user: &UserId) -> Result<(), RemoteError>;

    /// Subscribe to the user's document.
    async fn subscribe(
        &self,
        user: &UserId,
    ) -> Result<watch::Receiver<PreferenceSource>, RemoteError>;
}

/// In-memory remote store.
///
/// Subscribers are only notified when a write actually changes the
/// document, so echoing a merge result back does not loop.
#[derive(Debug, Clone, Default)]
pub struct MemoryRemoteStore {
    documents: Arc<DashMap<UserId, watch::Sender<PreferenceSource>>>,
    fail_next_update: Arc<AtomicBool>,
}

impl MemoryRemoteStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cause the next `update()` to fail.
    pub fn fail_next_update(&self) {
        self.fail_next_update.store(true, Ordering::SeqCst);
    }

    /// Current document for `user`, if one exists.
    pub fn document(&self, user: &UserId) -> Option<PreferenceSource> {
        self.documents.get(user).map(|tx| tx.borrow().clone())
    }

    fn sender(&self, user: &UserId) -> Ref<'_, UserId, watch::Sender<PreferenceSource>> {
        self.documents
            .entry(user.clone())
            .or_insert_with(|| watch::channel(PreferenceSource::default()).0)
            .downgrade()
    }
}

fn apply_patch(doc: &mut PreferenceSource, patch: PreferenceSource) -> bool {
    let before = doc.clone();
    if patch.units.is_some() {
        doc.units = patch.units;
    }
    if patch.initial_view.is_some() {
        doc.initial_view = patch.initial_view;
    }
    if patch.default_station.is_some() {
        doc.default_station = patch.default_station;
    }
    if patch.favorite_stations.is_some() {
        doc.favorite_stations = patch.favorite_stations;
    }
    if patch.display_variable.is_some() {
        doc.display_variable = patch.display_variable;
    }
    *doc != before
}

#[async_trait]
impl RemotePreferenceStore for MemoryRemoteStore {
    async fn fetch(&self, user: &UserId) -> Result<PreferenceSource, RemoteError> {
        Ok(self.document(user).unwrap_or_default())
    }

    async fn update(&self, user: &UserId, patch: PreferenceSource) -> Result<(), RemoteError> {
        if self.fail_next_update.swap(false, Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("injected failure".into()));
        }
        self.sender(user).send_if_modified(|doc| apply_patch(doc, patch));
        Ok(())
    }

    async fn delete(&self, user: &UserId) -> Result<(), RemoteError> {
        self.documents.remove(user);
        Ok(())
    }

    async fn subscribe(
        &self,
        user: &UserId,
    ) -> Result<watch::Receiver<PreferenceSource>, RemoteError> {
        Ok(self.sender(user).subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buoy_types::{StationId, UnitSystem};

    fn user() -> UserId {
        UserId::new("user-1")
    }

    #[tokio::test]
    async fn missing_document_is_empty() {
        let store = MemoryRemoteStore::new();
        assert!(store.fetch(&user()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_merges_present_fields() {
        let store = MemoryRemoteStore::new();
        store
            .update(
                &user(),
                PreferenceSource {
                    units: Some(UnitSystem::English),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        store
            .update(
                &user(),
                PreferenceSource {
                    favorite_stations: Some(vec![StationId::new("44097")]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let doc = store.fetch(&user()).await.unwrap();
        assert_eq!(doc.units, Some(UnitSystem::English));
        assert_eq!(doc.favorite_stations, Some(vec![StationId::new("44097")]));
    }

    #[tokio::test]
    async fn subscription_sees_current_and_changes_only() {
        let store = MemoryRemoteStore::new();
        let patch = PreferenceSource {
            units: Some(UnitSystem::English),
            ..Default::default()
        };
        store.update(&user(), patch.clone()).await.unwrap();

        let mut rx = store.subscribe(&user()).await.unwrap();
        assert_eq!(rx.borrow_and_update().units, Some(UnitSystem::English));

        // Same value again: no notification.
        store.update(&user(), patch).await.unwrap();
        assert!(!rx.has_changed().unwrap());

        store
            .update(
                &user(),
                PreferenceSource {
                    units: Some(UnitSystem::Metric),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn delete_closes_subscription() {
        let store = MemoryRemoteStore::new();
        let mut rx = store.subscribe(&user()).await.unwrap();
        store.delete(&user()).await.unwrap();
        assert!(rx.changed().await.is_err());
        assert!(store.document(&user()).is_none());
    }

    #[tokio::test]
    async fn injected_update_failure() {
        let store = MemoryRemoteStore::new();
        store.fail_next_update();
        assert!(store
            .update(&user(), PreferenceSource::default())
            .await
            .is_err());
        assert!(store
            .update(&user(), PreferenceSource::default())
            .await
            .is_ok());
    }
}
