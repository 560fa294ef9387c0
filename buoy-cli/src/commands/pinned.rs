//! Pin a station for the widget and show it.

use anyhow::Result;
use buoy_types::StationId;

use super::station::describe;
use crate::app::App;

/// Run the pinned command.
///
/// With `id`, pins that station first. Then refreshes the pinned station
/// when stale (always with `force`) and prints it.
pub async fn run(app: &App, id: Option<&str>, force: bool) -> Result<()> {
    // Fetch in the user's unit system.
    app.pinned.set_units(app.settings.units().await).await?;

    if let Some(id) = id {
        let id = StationId::new(id);
        if !app.pinned.identify(&id).await {
            app.pinned.load(&id).await?;
        }
    }

    let Some(station) = app.pinned.refresh(force).await? else {
        println!("No station pinned.");
        println!();
        println!("Run 'buoy pinned --id <station>' to pin one.");
        return Ok(());
    };

    let variable = app.settings.display_variable().await;
    for line in describe(&station, variable) {
        println!("{}", line);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing;
    use tempfile::tempdir;

    #[tokio::test]
    async fn nothing_pinned() {
        let dir = tempdir().unwrap();
        let app = testing::app(dir.path()).await;

        run(&app, None, false).await.unwrap();
        assert!(app.pinned.station().await.is_none());
    }

    #[tokio::test]
    async fn pin_and_reopen() {
        let dir = tempdir().unwrap();
        {
            let app = testing::app(dir.path()).await;
            run(&app, Some("44097"), false).await.unwrap();
            assert!(app.pinned.identify(&StationId::new("44097")).await);
        }

        let app = testing::app(dir.path()).await;
        let station = app.pinned.station().await.unwrap();
        assert_eq!(station.id, StationId::new("44097"));
        assert!(station.latest_data().is_some());

        run(&app, None, true).await.unwrap();
    }

    #[tokio::test]
    async fn pin_unknown_station_fails() {
        let dir = tempdir().unwrap();
        let app = testing::app(dir.path()).await;

        assert!(run(&app, Some("99999"), false).await.is_err());
    }
}
