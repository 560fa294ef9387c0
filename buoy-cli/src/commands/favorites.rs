//! Manage favorite stations.

use anyhow::Result;
use buoy_types::StationId;

use super::station_title;
use crate::app::App;

/// List favorites in order.
pub async fn list(app: &App) -> Result<()> {
    let ids = app.settings.favorite_ids().await;
    if ids.is_empty() {
        println!("No favorites yet.");
        println!();
        println!("Run 'buoy favorites add <station>' to add one.");
        return Ok(());
    }

    for (index, id) in ids.iter().enumerate() {
        match app.directory.station(id).await {
            Some(station) => println!("  [{}] {}", index, station_title(&station)),
            None => println!("  [{}] {} (not in catalog)", index, id),
        }
    }
    Ok(())
}

/// Append a station to the favorites.
pub async fn add(app: &App, id: &str) -> Result<()> {
    let id = StationId::new(id);
    if app.settings.add_favorite(id.clone()).await? {
        println!("Added {} to favorites", id);
    } else {
        println!("{} is already a favorite", id);
    }
    Ok(())
}

/// Remove a station from the favorites.
pub async fn remove(app: &App, id: &str) -> Result<()> {
    let id = StationId::new(id);
    if app.settings.remove_favorite(&id).await? {
        println!("Removed {} from favorites", id);
    } else {
        println!("{} is not a favorite", id);
    }
    Ok(())
}

/// Move the favorite at `from` to position `to`.
pub async fn reorder(app: &App, from: usize, to: usize) -> Result<()> {
    app.settings.move_favorite(from, to).await?;
    list(app).await
}
