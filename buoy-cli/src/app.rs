//! Store wiring shared by every command.

use anyhow::{Context, Result};
use buoy_client::{
    ClientConfig, JsonFileStore, MemoryRemoteStore, PinnedStationCache, SettingsStore,
    StationDirectory,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::fixtures::FixtureSource;

/// Data source used by the CLI.
pub type Source = Arc<FixtureSource>;

/// Open stores for one CLI invocation.
pub struct App {
    /// Station catalog and per-station data.
    pub directory: Arc<StationDirectory<Source>>,
    /// User preferences.
    pub settings: SettingsStore,
    /// Widget station.
    pub pinned: PinnedStationCache<Source>,
}

impl App {
    /// Load configuration, fixtures and the persisted stores under `data_dir`.
    pub async fn open(
        data_dir: &Path,
        fixtures: Option<&Path>,
        config: Option<&Path>,
    ) -> Result<Self> {
        let config = match config {
            Some(path) => ClientConfig::from_file(path)?,
            None => ClientConfig::default(),
        };

        let source: Source = match fixtures {
            Some(path) => Arc::new(FixtureSource::load(path).await?),
            None => {
                warn!("No fixtures given, the station catalog is empty");
                Arc::new(FixtureSource::default())
            }
        };

        let directory = Arc::new(StationDirectory::new(source.clone(), &config));
        let count = directory
            .load_catalog()
            .await
            .context("Failed to load station catalog")?;
        debug!(stations = count, "Catalog ready");

        let preferences = JsonFileStore::open(data_dir.join(&config.storage.preferences_file))
            .await
            .context("Failed to open preferences")?;
        debug!(path = %preferences.path().display(), "Preferences store");
        let settings = SettingsStore::open(
            Arc::new(preferences),
            Arc::new(MemoryRemoteStore::new()),
            directory.clone(),
            &config,
        )
        .await?;

        let pinned_store = JsonFileStore::open(data_dir.join(&config.storage.pinned_file))
            .await
            .context("Failed to open pinned station store")?;
        let pinned = PinnedStationCache::open(source, Arc::new(pinned_store), &config).await?;

        Ok(Self {
            directory,
            settings,
            pinned,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Two stations off New England; 44013 only reports weather.
    pub(crate) const FIXTURES: &str = r#"{
        "stations": [
            { "id": "44097", "location": { "latitude": 40.97, "longitude": -71.13, "name": "Block Island" }, "owner": "CDIP" },
            { "id": "44013", "location": { "latitude": 42.35, "longitude": -70.65, "name": "Boston" } }
        ],
        "data": {
            "44097": {
                "date": 1700000000,
                "units": "metric",
                "wave": {
                    "summary": { "wave_height": 1.2, "period": 8.0, "direction": 160.0, "compass_direction": "SSE" }
                },
                "weather": { "wind_speed": 5.0, "wind_gust": 8.0, "air_temperature": 10.0, "pressure": 1013.2 }
            },
            "44013": {
                "date": 1700000000,
                "units": "metric",
                "weather": { "pressure": 1015.0 }
            }
        },
        "next_updates": { "44097": 1700001800 }
    }"#;

    /// Write the fixtures into `dir` and open an app on it.
    pub(crate) async fn app(dir: &Path) -> App {
        let path = dir.join("fixtures.json");
        tokio::fs::write(&path, FIXTURES).await.unwrap();
        App::open(dir, Some(&path), None).await.unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buoy_types::StationId;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_loads_catalog() {
        let dir = tempdir().unwrap();
        let app = testing::app(dir.path()).await;

        assert_eq!(app.directory.len().await, 2);
        assert!(app.directory.contains(&StationId::new("44097")).await);
    }

    #[tokio::test]
    async fn open_without_fixtures_is_empty() {
        let dir = tempdir().unwrap();
        let app = App::open(dir.path(), None, None).await.unwrap();
        assert!(app.directory.is_empty().await);
    }

    #[tokio::test]
    async fn settings_survive_reopen() {
        let dir = tempdir().unwrap();
        {
            let app = testing::app(dir.path()).await;
            app.settings
                .add_favorite(StationId::new("44097"))
                .await
                .unwrap();
        }

        let app = testing::app(dir.path()).await;
        assert_eq!(
            app.settings.favorite_ids().await,
            vec![StationId::new("44097")]
        );
    }

    #[tokio::test]
    async fn open_rejects_bad_config() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("buoy.toml");
        tokio::fs::write(&config, "[cache]\nfreshness_window_secs = 0\n")
            .await
            .unwrap();

        assert!(App::open(dir.path(), None, Some(&config)).await.is_err());
    }
}
