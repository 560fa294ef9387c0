//! Show and change preferences.

use anyhow::Result;
use buoy_core::{DisplayVariable, InitialView};
use buoy_types::{StationId, UnitSystem};

use crate::app::App;

/// Print every preference.
pub async fn show(app: &App) -> Result<()> {
    let prefs = app.settings.preferences().await;

    println!("=== buoy settings ===");
    println!();
    println!("  Units:            {}", prefs.units);
    println!("  Initial view:     {}", prefs.initial_view);
    match &prefs.default_station {
        Some(id) => println!("  Default station:  {}", id),
        None => println!("  Default station:  (none)"),
    }
    println!("  Display variable: {}", prefs.display_variable);
    println!("  Favorites:        {}", prefs.favorites.len());

    Ok(())
}

/// Set the unit system.
pub async fn set_units(app: &App, value: &str) -> Result<()> {
    let units: UnitSystem = value.parse().map_err(anyhow::Error::msg)?;
    report(app.settings.set_units(units).await?, "Units", units);
    // Keep the widget station in the same system.
    app.pinned.set_units(units).await?;
    Ok(())
}

/// Set the initial view.
pub async fn set_initial_view(app: &App, value: &str) -> Result<()> {
    let view: InitialView = value.parse()?;
    report(app.settings.set_initial_view(view).await?, "Initial view", view);
    Ok(())
}

/// Set or clear the default station.
pub async fn set_default_station(app: &App, value: Option<&str>) -> Result<()> {
    let id = value.map(StationId::new);
    let changed = app.settings.set_default_station(id.clone()).await?;
    match id {
        Some(id) => report(changed, "Default station", id),
        None => report(changed, "Default station", "(none)"),
    }
    Ok(())
}

/// Set the map marker variable.
pub async fn set_display_variable(app: &App, value: &str) -> Result<()> {
    let variable: DisplayVariable = value.parse()?;
    report(
        app.settings.set_display_variable(variable).await?,
        "Display variable",
        variable,
    );
    Ok(())
}

fn report(changed: bool, name: &str, value: impl std::fmt::Display) {
    if changed {
        println!("{} set to {}", name, value);
    } else {
        println!("{} already {}", name, value);
    }
}
