//! SettingsStore - user preferences with local and remote persistence.
//!
//! # Architecture
//!
//! ```text
//! mutation → Preferences (memory) → KeyValueStore (always)
//!                                 → RemotePreferenceStore (when signed in)
//!
//! remote document change ─┐
//! CatalogUpdated ─────────┴→ merge into memory → KeyValueStore
//! ```
//!
//! While signed out, the local tier is the only source and favorites are
//! kept verbatim, resolved against the catalog only when read. While signed
//! in, the remote document is authoritative: every version of it is merged
//! with [`Preferences::merge`], dropping favorites the catalog does not know
//! yet. The last document is kept so a later catalog load can retry them.

use crate::config::ClientConfig;
use crate::directory::StationLookup;
use crate::error::ClientError;
use crate::events::{DirectoryEvent, SettingsEvent};
use crate::remote::{RemotePreferenceStore, UserId};
use crate::storage::{get_json, set_json, KeyValueStore};
use buoy_core::{DisplayVariable, InitialView, MergeReport, PreferenceSource, Preferences};
use buoy_types::{StationId, UnitSystem};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::sync::{Arc, OnceLock, Weak};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Local storage keys for preferences.
pub mod keys {
    /// Unit system.
    pub const UNITS: &str = "units";
    /// Initial view.
    pub const INITIAL_VIEW: &str = "initial_view";
    /// Default station id.
    pub const DEFAULT_STATION: &str = "default_station";
    /// Ordered favorite ids.
    pub const FAVORITE_STATIONS: &str = "favorite_stations";
    /// Map marker variable.
    pub const DISPLAY_VARIABLE: &str = "display_variable";
}

/// User preferences shared between the local and remote tiers.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SettingsStore {
    inner: Arc<Inner>,
}

struct Inner {
    local: Arc<dyn KeyValueStore>,
    remote: Arc<dyn RemotePreferenceStore>,
    lookup: Arc<dyn StationLookup>,
    state: Mutex<State>,
    events: broadcast::Sender<SettingsEvent>,
    catalog_listener: OnceLock<JoinHandle<()>>,
}

#[derive(Default)]
struct State {
    prefs: Preferences,
    session: Option<Session>,
}

struct Session {
    user: UserId,
    last_remote: Option<PreferenceSource>,
    listener: Option<JoinHandle<()>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(handle) = self.catalog_listener.get() {
            handle.abort();
        }
        if let Some(listener) = self
            .state
            .get_mut()
            .session
            .as_mut()
            .and_then(|s| s.listener.take())
        {
            listener.abort();
        }
    }
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore").finish_non_exhaustive()
    }
}

impl SettingsStore {
    /// Open the store, loading preferences from the local tier.
    ///
    /// Starts a background task that re-merges the remote document whenever
    /// `lookup` announces a new catalog. Must be called within a tokio
    /// runtime.
    pub async fn open(
        local: Arc<dyn KeyValueStore>,
        remote: Arc<dyn RemotePreferenceStore>,
        lookup: Arc<dyn StationLookup>,
        config: &ClientConfig,
    ) -> Result<Self, ClientError> {
        let prefs = load_local(local.as_ref()).await;
        debug!(favorites = prefs.favorites.len(), units = %prefs.units, "Loaded local preferences");

        let catalog_events = lookup.events();
        let (events, _) = broadcast::channel(config.directory.event_capacity.max(1));
        let inner = Arc::new(Inner {
            local,
            remote,
            lookup,
            state: Mutex::new(State {
                prefs,
                session: None,
            }),
            events,
            catalog_listener: OnceLock::new(),
        });

        let handle = tokio::spawn(listen_catalog(Arc::downgrade(&inner), catalog_events));
        // Freshly created, so the cell is empty.
        let _ = inner.catalog_listener.set(handle);

        Ok(Self { inner })
    }

    /// Subscribe to settings events.
    pub fn subscribe(&self) -> broadcast::Receiver<SettingsEvent> {
        self.inner.events.subscribe()
    }

    /// Snapshot of every preference.
    pub async fn preferences(&self) -> Preferences {
        self.inner.state.lock().await.prefs.clone()
    }

    // =========================================================================
    // Scalar preferences
    // =========================================================================

    /// Current unit system.
    pub async fn units(&self) -> UnitSystem {
        self.inner.state.lock().await.prefs.units
    }

    /// Change the unit system. Returns false if unchanged.
    ///
    /// Cached station data is not converted; callers re-fetch or convert.
    pub async fn set_units(&self, units: UnitSystem) -> Result<bool, ClientError> {
        self.mutate(|prefs| Ok(std::mem::replace(&mut prefs.units, units) != units))
            .await
    }

    /// Current initial view.
    pub async fn initial_view(&self) -> InitialView {
        self.inner.state.lock().await.prefs.initial_view
    }

    /// Change the initial view. Returns false if unchanged.
    pub async fn set_initial_view(&self, view: InitialView) -> Result<bool, ClientError> {
        self.mutate(|prefs| Ok(std::mem::replace(&mut prefs.initial_view, view) != view))
            .await
    }

    /// Current map marker variable.
    pub async fn display_variable(&self) -> DisplayVariable {
        self.inner.state.lock().await.prefs.display_variable
    }

    /// Change the map marker variable. Returns false if unchanged.
    pub async fn set_display_variable(
        &self,
        variable: DisplayVariable,
    ) -> Result<bool, ClientError> {
        self.mutate(|prefs| {
            Ok(std::mem::replace(&mut prefs.display_variable, variable) != variable)
        })
        .await
    }

    /// Current default station.
    pub async fn default_station(&self) -> Option<StationId> {
        self.inner.state.lock().await.prefs.default_station.clone()
    }

    /// Change the default station. A station id must be in the catalog.
    pub async fn set_default_station(&self, id: Option<StationId>) -> Result<bool, ClientError> {
        if let Some(id) = &id {
            if !self.inner.lookup.is_known(id).await {
                return Err(ClientError::UnknownStation(id.clone()));
            }
        }
        self.mutate(|prefs| {
            if prefs.default_station == id {
                return Ok(false);
            }
            prefs.default_station = id;
            Ok(true)
        })
        .await
    }

    // =========================================================================
    // Favorites
    // =========================================================================

    /// Favorite ids in user order.
    pub async fn favorite_ids(&self) -> Vec<StationId> {
        self.inner.state.lock().await.prefs.favorites.clone()
    }

    /// Whether `id` is a favorite.
    pub async fn is_favorite(&self, id: &StationId) -> bool {
        self.inner.state.lock().await.prefs.is_favorite(id)
    }

    /// Favorites resolved against the catalog, in user order.
    ///
    /// Ids the catalog does not know are skipped.
    pub async fn favorite_stations(&self) -> Vec<buoy_core::Station> {
        let ids = self.favorite_ids().await;
        let mut stations = Vec::with_capacity(ids.len());
        for id in &ids {
            if let Some(station) = self.inner.lookup.resolve(id).await {
                stations.push(station);
            }
        }
        stations
    }

    /// Append `id` to the favorites. Returns false if already present.
    pub async fn add_favorite(&self, id: StationId) -> Result<bool, ClientError> {
        if self.is_favorite(&id).await {
            return Ok(false);
        }
        if !self.inner.lookup.is_known(&id).await {
            return Err(ClientError::UnknownStation(id));
        }
        self.mutate(|prefs| Ok(prefs.add_favorite(id))).await
    }

    /// Remove `id` from the favorites. Returns false if it was not present.
    pub async fn remove_favorite(&self, id: &StationId) -> Result<bool, ClientError> {
        self.mutate(|prefs| Ok(prefs.remove_favorite(id))).await
    }

    /// Move the favorite at `from` to `to`.
    pub async fn move_favorite(&self, from: usize, to: usize) -> Result<(), ClientError> {
        self.mutate(|prefs| {
            prefs.move_favorite(from, to)?;
            Ok(from != to)
        })
        .await
        .map(|_| ())
    }

    async fn mutate<F>(&self, f: F) -> Result<bool, ClientError>
    where
        F: FnOnce(&mut Preferences) -> Result<bool, ClientError>,
    {
        let mut state = self.inner.state.lock().await;
        let mut next = state.prefs.clone();
        if !f(&mut next)? {
            return Ok(false);
        }

        self.inner.persist_local(&next).await?;
        state.prefs = next;
        self.inner.push_remote(&state).await;
        // Re-merges diff against local writes, landed or not.
        let written = state.prefs.to_source();
        if let Some(session) = state.session.as_mut() {
            session.last_remote = Some(written);
        }
        self.inner.emit();
        Ok(true)
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// The signed-in user.
    pub async fn user(&self) -> Option<UserId> {
        self.inner
            .state
            .lock()
            .await
            .session
            .as_ref()
            .map(|s| s.user.clone())
    }

    /// Whether a user is signed in.
    pub async fn is_signed_in(&self) -> bool {
        self.inner.state.lock().await.session.is_some()
    }

    /// Start a session for `user`.
    ///
    /// Resets memory to defaults, merges the user's current remote document
    /// and keeps merging every later version until sign-out.
    pub async fn sign_in(&self, user: UserId) -> Result<(), ClientError> {
        let mut rx = self.inner.remote.subscribe(&user).await?;

        let mut state = self.inner.state.lock().await;
        if let Some(previous) = state.session.take() {
            debug!(user = %previous.user, "Replacing previous session");
            abort_listener(previous);
        }

        let before = std::mem::take(&mut state.prefs);
        let doc = rx.borrow_and_update().clone();
        let report = self.inner.merge_locked(&mut state.prefs, &doc).await;
        if report.changed {
            self.inner.persist_local(&state.prefs).await?;
        }

        let listener = tokio::spawn(listen_remote(
            Arc::downgrade(&self.inner),
            user.clone(),
            rx,
        ));
        state.session = Some(Session {
            user: user.clone(),
            last_remote: Some(doc),
            listener: Some(listener),
        });

        info!(user = %user, favorites = state.prefs.favorites.len(), "Signed in");
        if state.prefs != before {
            self.inner.emit();
        }
        Ok(())
    }

    /// End the session and fall back to the local tier.
    pub async fn sign_out(&self) -> Result<(), ClientError> {
        let mut state = self.inner.state.lock().await;
        let Some(session) = state.session.take() else {
            return Ok(());
        };
        info!(user = %session.user, "Signed out");
        abort_listener(session);

        self.inner.reload_local(&mut state).await;
        Ok(())
    }

    /// Delete the signed-in user's remote document and end the session.
    pub async fn delete_user(&self) -> Result<(), ClientError> {
        let mut state = self.inner.state.lock().await;
        let Some(session) = state.session.take() else {
            return Err(ClientError::NotSignedIn);
        };
        let user = session.user.clone();
        abort_listener(session);

        self.inner.remote.delete(&user).await?;
        info!(user = %user, "Deleted remote preferences");

        self.inner.reload_local(&mut state).await;
        Ok(())
    }
}

impl Inner {
    fn emit(&self) {
        // No subscribers is fine.
        let _ = self.events.send(SettingsEvent::Changed);
    }

    /// Merge `source` into `prefs`, resolving new favorites first.
    async fn merge_locked(&self, prefs: &mut Preferences, source: &PreferenceSource) -> MergeReport {
        let mut known = HashSet::new();
        if let Some(incoming) = &source.favorite_stations {
            for id in incoming {
                if !prefs.is_favorite(id) && self.lookup.is_known(id).await {
                    known.insert(id.clone());
                }
            }
        }

        let report = prefs.merge(source, |id| known.contains(id));
        if !report.dropped.is_empty() {
            debug!(dropped = ?report.dropped, "Skipped favorites missing from catalog");
        }
        report
    }

    /// Merge the latest remote document for `user`.
    async fn apply_remote(&self, user: &UserId, rx: &mut watch::Receiver<PreferenceSource>) {
        let mut state = self.state.lock().await;
        let doc = rx.borrow_and_update().clone();
        if !matches!(&state.session, Some(s) if &s.user == user) {
            return;
        }

        let report = self.merge_locked(&mut state.prefs, &doc).await;
        if let Some(session) = state.session.as_mut() {
            session.last_remote = Some(doc);
        }
        self.finish_merge(&state, &report).await;
    }

    /// Retry the last remote document against a new catalog.
    async fn remerge(&self) {
        let mut state = self.state.lock().await;
        let Some(doc) = state.session.as_ref().and_then(|s| s.last_remote.clone()) else {
            return;
        };

        let report = self.merge_locked(&mut state.prefs, &doc).await;
        self.finish_merge(&state, &report).await;
    }

    async fn finish_merge(&self, state: &State, report: &MergeReport) {
        if !report.changed {
            return;
        }
        info!(favorites = state.prefs.favorites.len(), "Merged remote preferences");
        if let Err(e) = self.persist_local(&state.prefs).await {
            warn!(error = %e, "Failed to persist merged preferences");
        }
        self.emit();
    }

    async fn reload_local(&self, state: &mut State) {
        let before = std::mem::take(&mut state.prefs);
        state.prefs = load_local(self.local.as_ref()).await;
        if state.prefs != before {
            self.emit();
        }
    }

    async fn persist_local(&self, prefs: &Preferences) -> Result<(), ClientError> {
        let local = self.local.as_ref();
        set_json(local, keys::UNITS, &prefs.units).await?;
        set_json(local, keys::INITIAL_VIEW, &prefs.initial_view).await?;
        match &prefs.default_station {
            Some(id) => set_json(local, keys::DEFAULT_STATION, id).await?,
            None => local.remove(keys::DEFAULT_STATION).await?,
        }
        set_json(local, keys::FAVORITE_STATIONS, &prefs.favorites).await?;
        set_json(local, keys::DISPLAY_VARIABLE, &prefs.display_variable).await?;
        Ok(())
    }

    /// Write the full record remotely. Failures are logged; the next
    /// successful write carries every field again.
    async fn push_remote(&self, state: &State) {
        let Some(session) = &state.session else {
            return;
        };
        if let Err(e) = self
            .remote
            .update(&session.user, state.prefs.to_source())
            .await
        {
            warn!(user = %session.user, error = %e, "Failed to write remote preferences");
        }
    }
}

fn abort_listener(mut session: Session) {
    if let Some(listener) = session.listener.take() {
        listener.abort();
    }
}

async fn load_local(local: &dyn KeyValueStore) -> Preferences {
    let mut prefs = Preferences::default();
    if let Some(units) = read_key(local, keys::UNITS).await {
        prefs.units = units;
    }
    if let Some(view) = read_key(local, keys::INITIAL_VIEW).await {
        prefs.initial_view = view;
    }
    prefs.default_station = read_key::<StationId>(local, keys::DEFAULT_STATION)
        .await
        .filter(|id| !id.is_empty());
    if let Some(favorites) = read_key::<Vec<StationId>>(local, keys::FAVORITE_STATIONS).await {
        for id in favorites {
            prefs.add_favorite(id);
        }
    }
    if let Some(variable) = read_key(local, keys::DISPLAY_VARIABLE).await {
        prefs.display_variable = variable;
    }
    prefs
}

async fn read_key<T: DeserializeOwned>(local: &dyn KeyValueStore, key: &str) -> Option<T> {
    match get_json(local, key).await {
        Ok(value) => value,
        Err(e) => {
            warn!(key, error = %e, "Ignoring unreadable preference");
            None
        }
    }
}

async fn listen_remote(
    inner: Weak<Inner>,
    user: UserId,
    mut rx: watch::Receiver<PreferenceSource>,
) {
    while rx.changed().await.is_ok() {
        let Some(inner) = inner.upgrade() else {
            break;
        };
        inner.apply_remote(&user, &mut rx).await;
    }
    debug!(user = %user, "Remote listener stopped");
}

async fn listen_catalog(inner: Weak<Inner>, mut rx: broadcast::Receiver<DirectoryEvent>) {
    loop {
        match rx.recv().await {
            Ok(DirectoryEvent::CatalogUpdated) | Err(RecvError::Lagged(_)) => {
                let Some(inner) = inner.upgrade() else {
                    break;
                };
                inner.remerge().await;
            }
            Ok(_) => {}
            Err(RecvError::Closed) => break,
        }
    }
}
