//! Show one station with its latest data.

use anyhow::{Context, Result};
use buoy_core::{DisplayVariable, Station};
use buoy_types::StationId;
use tracing::debug;

use super::station_title;
use crate::app::App;

/// Run the station command.
pub async fn run(app: &App, id: &str) -> Result<()> {
    let id = StationId::new(id);
    if !app.directory.contains(&id).await {
        anyhow::bail!("Unknown station: {}", id);
    }

    let units = app.settings.units().await;
    if !app.directory.refresh_all(&id, units).await {
        debug!(station = %id, "Showing cached data");
    }
    if let Err(e) = app.directory.fetch_next_update_time(&id).await {
        debug!(station = %id, error = %e, "No next update time");
    }

    let station = app
        .directory
        .station(&id)
        .await
        .context("Station vanished from the catalog")?;
    let variable = app.settings.display_variable().await;
    for line in describe(&station, variable) {
        println!("{}", line);
    }

    Ok(())
}

/// Printable lines for a station.
pub(crate) fn describe(station: &Station, variable: DisplayVariable) -> Vec<String> {
    let mut lines = vec![format!("=== {} ===", station_title(station))];
    lines.push(format!(
        "  Location: {:.3}, {:.3}",
        station.location.latitude, station.location.longitude
    ));
    if let Some(owner) = &station.metadata.owner {
        lines.push(format!("  Owner:    {}", owner));
    }
    if let Some(next) = station.next_update {
        lines.push(format!("  Next:     {}", next));
    }

    let Some(data) = station.latest_data() else {
        lines.push("  No data".to_string());
        return lines;
    };

    lines.push(format!("  Updated:  {} ({})", data.latest_update(), data.units));
    if let Some(summary) = &data.wave.summary {
        lines.push(format!("  Waves:    {}", summary.detailed_description()));
    }
    for swell in &data.wave.components {
        lines.push(format!("    Swell:  {}", swell.simple_description()));
    }
    for (name, value) in data.weather_display() {
        lines.push(format!("  {}: {}", name, value));
    }
    if let Some(value) = data.display_value(variable) {
        lines.push(format!("  Widget ({}): {}", variable, value));
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing;
    use buoy_types::UnitSystem;
    use tempfile::tempdir;

    #[tokio::test]
    async fn station_refreshes_and_prints() {
        let dir = tempdir().unwrap();
        let app = testing::app(dir.path()).await;

        run(&app, "44097").await.unwrap();

        let station = app.directory.station(&StationId::new("44097")).await.unwrap();
        assert!(station.latest_data().is_some());
        assert!(station.next_update.is_some());
    }

    #[tokio::test]
    async fn station_in_english_units() {
        let dir = tempdir().unwrap();
        let app = testing::app(dir.path()).await;
        app.settings.set_units(UnitSystem::English).await.unwrap();

        run(&app, "44097").await.unwrap();

        let station = app.directory.station(&StationId::new("44097")).await.unwrap();
        assert_eq!(station.data_units(), Some(UnitSystem::English));
    }

    #[tokio::test]
    async fn unknown_station_is_an_error() {
        let dir = tempdir().unwrap();
        let app = testing::app(dir.path()).await;

        assert!(run(&app, "99999").await.is_err());
    }

    #[tokio::test]
    async fn describe_includes_widget_value() {
        let dir = tempdir().unwrap();
        let app = testing::app(dir.path()).await;
        run(&app, "44097").await.unwrap();

        let station = app.directory.station(&StationId::new("44097")).await.unwrap();
        let lines = describe(&station, DisplayVariable::Waves);
        assert!(lines.iter().any(|l| l.contains("Widget (waves): 1.2 m @ 8.0 s SSE")));
        assert!(lines.iter().any(|l| l.starts_with("  Wind Gust:")));
    }

    #[tokio::test]
    async fn describe_without_data() {
        let dir = tempdir().unwrap();
        let app = testing::app(dir.path()).await;

        let station = app.directory.station(&StationId::new("44013")).await.unwrap();
        let lines = describe(&station, DisplayVariable::Waves);
        assert_eq!(lines.last().unwrap(), "  No data");
    }
}
