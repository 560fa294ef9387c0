//! List stations near a position.

use anyhow::Result;
use buoy_types::Location;

use super::{distance_label, station_title};
use crate::app::App;

/// Run the nearby command.
pub async fn run(app: &App, latitude: f64, longitude: f64, radius: f64) -> Result<()> {
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        anyhow::bail!("Coordinates out of range: {}, {}", latitude, longitude);
    }

    let units = app.settings.units().await;
    let label = distance_label(units);
    let location = Location::new(latitude, longitude);
    let stations = app.directory.nearby(&location, radius, units).await;

    if stations.is_empty() {
        println!("No stations within {} {}", radius, label);
        return Ok(());
    }

    println!("{} station(s) within {} {}:", stations.len(), radius, label);
    for (station, distance) in &stations {
        let star = if app.settings.is_favorite(&station.id).await {
            "*"
        } else {
            " "
        };
        println!("  {} {:>8.1} {}  {}", star, distance, label, station_title(station));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing;
    use tempfile::tempdir;

    #[tokio::test]
    async fn nearby_lists_stations() {
        let dir = tempdir().unwrap();
        let app = testing::app(dir.path()).await;

        run(&app, 41.0, -71.0, 50.0).await.unwrap();
    }

    #[tokio::test]
    async fn nearby_with_nothing_in_range() {
        let dir = tempdir().unwrap();
        let app = testing::app(dir.path()).await;

        run(&app, 0.0, 0.0, 10.0).await.unwrap();
    }

    #[tokio::test]
    async fn nearby_rejects_bad_coordinates() {
        let dir = tempdir().unwrap();
        let app = testing::app(dir.path()).await;

        assert!(run(&app, 91.0, 0.0, 10.0).await.is_err());
    }
}
