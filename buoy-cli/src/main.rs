//! # buoy
//!
//! CLI tool for exercising the BuoyFinder sync engine.
//!
//! Station data comes from a JSON fixture file; preferences and the pinned
//! station persist under the data directory between runs.
//!
//! ## Commands
//!
//! - `nearby`: List stations around a position
//! - `station`: Refresh and show one station
//! - `favorites`: List, add, remove or reorder favorites
//! - `settings`: Show or change preferences
//! - `pinned`: Pin a station for the widget and show it
//!
//! ## Example
//!
//! ```bash
//! # Stations within 50 km of Block Island
//! buoy --fixtures stations.json nearby --lat 41.0 --lon -71.0 --radius 50
//!
//! # Show a station in english units
//! buoy --fixtures stations.json settings units english
//! buoy --fixtures stations.json station 44097
//!
//! # Pin it for the widget
//! buoy --fixtures stations.json pinned --id 44097
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod app;
mod commands;
mod fixtures;

use app::App;
use commands::{favorites, nearby, pinned, settings, station};

/// CLI tool for exercising the BuoyFinder sync engine.
#[derive(Parser, Debug)]
#[command(name = "buoy")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Data directory for preferences and the pinned station
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// JSON file with the station catalog and readings
    #[arg(long, global = true)]
    fixtures: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List stations near a position
    Nearby {
        /// Latitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Search radius in km (metric) or mi (english)
        #[arg(long, default_value = "100")]
        radius: f64,
    },

    /// Refresh and show one station
    Station {
        /// Station id
        id: String,
    },

    /// Manage favorite stations
    Favorites {
        #[command(subcommand)]
        action: Option<FavoritesCommand>,
    },

    /// Show or change preferences
    Settings {
        #[command(subcommand)]
        action: Option<SettingsCommand>,
    },

    /// Pin a station for the widget and show it
    Pinned {
        /// Station to pin
        #[arg(long)]
        id: Option<String>,

        /// Refresh even if the cached data is fresh
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum FavoritesCommand {
    /// List favorites
    List,
    /// Add a station
    Add {
        /// Station id
        id: String,
    },
    /// Remove a station
    Remove {
        /// Station id
        id: String,
    },
    /// Move a favorite to another position
    Move {
        /// Current index
        from: usize,
        /// New index
        to: usize,
    },
}

#[derive(Subcommand, Debug)]
enum SettingsCommand {
    /// Show every preference
    Show,
    /// Set the unit system (metric, english)
    Units {
        /// Unit system
        value: String,
    },
    /// Set the initial view (explore, favorites, default-station)
    InitialView {
        /// View name
        value: String,
    },
    /// Set or clear the default station
    Default {
        /// Station id
        #[arg(conflicts_with = "clear")]
        id: Option<String>,

        /// Clear the default station
        #[arg(long)]
        clear: bool,
    },
    /// Set the map marker variable
    Variable {
        /// Variable name, e.g. waves, wind, air-temperature
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    // Determine data directory
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };

    tokio::fs::create_dir_all(&data_dir)
        .await
        .context("Failed to create data directory")?;

    let app = App::open(&data_dir, cli.fixtures.as_deref(), cli.config.as_deref()).await?;

    match cli.command {
        Commands::Nearby { lat, lon, radius } => {
            nearby::run(&app, lat, lon, radius).await?;
        }
        Commands::Station { id } => {
            station::run(&app, &id).await?;
        }
        Commands::Favorites { action } => match action.unwrap_or(FavoritesCommand::List) {
            FavoritesCommand::List => favorites::list(&app).await?,
            FavoritesCommand::Add { id } => favorites::add(&app, &id).await?,
            FavoritesCommand::Remove { id } => favorites::remove(&app, &id).await?,
            FavoritesCommand::Move { from, to } => favorites::reorder(&app, from, to).await?,
        },
        Commands::Settings { action } => match action.unwrap_or(SettingsCommand::Show) {
            SettingsCommand::Show => settings::show(&app).await?,
            SettingsCommand::Units { value } => settings::set_units(&app, &value).await?,
            SettingsCommand::InitialView { value } => {
                settings::set_initial_view(&app, &value).await?
            }
            SettingsCommand::Default { id, clear } => {
                if id.is_none() && !clear {
                    anyhow::bail!("Must specify a station id or --clear");
                }
                settings::set_default_station(&app, id.as_deref()).await?
            }
            SettingsCommand::Variable { value } => {
                settings::set_display_variable(&app, &value).await?
            }
        },
        Commands::Pinned { id, force } => {
            pinned::run(&app, id.as_deref(), force).await?;
        }
    }

    Ok(())
}

/// Get the default data directory for buoy.
fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("io", "buoyfinder", "buoy")
        .context("Could not determine home directory")?;
    Ok(dirs.data_dir().to_path_buf())
}
