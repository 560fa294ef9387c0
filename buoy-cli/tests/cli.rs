//! End-to-end runs of the `buoy` binary against a fixture file.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::tempdir;

const FIXTURES: &str = r#"{
    "stations": [
        { "id": "44097", "location": { "latitude": 40.97, "longitude": -71.13, "name": "Block Island" } },
        { "id": "44013", "location": { "latitude": 42.35, "longitude": -70.65, "name": "Boston" } }
    ],
    "data": {
        "44097": {
            "date": 1700000000,
            "units": "metric",
            "wave": { "summary": { "wave_height": 1.2, "period": 8.0, "compass_direction": "SSE" } },
            "weather": { "wind_speed": 5.0, "air_temperature": 10.0 }
        }
    }
}"#;

fn buoy(dir: &Path) -> Command {
    let fixtures = dir.join("fixtures.json");
    std::fs::write(&fixtures, FIXTURES).unwrap();

    let mut cmd = Command::cargo_bin("buoy").unwrap();
    cmd.arg("--data-dir")
        .arg(dir)
        .arg("--fixtures")
        .arg(fixtures)
        .env("RUST_LOG", "off");
    cmd
}

#[test]
fn nearby_finds_block_island() {
    let dir = tempdir().unwrap();
    buoy(dir.path())
        .args(["nearby", "--lat", "41.0", "--lon", "-71.0", "--radius", "50"])
        .assert()
        .success()
        .stdout(predicate::str::contains("44097 Block Island"))
        .stdout(predicate::str::contains("Boston").not());
}

#[test]
fn favorites_persist_between_runs() {
    let dir = tempdir().unwrap();
    buoy(dir.path())
        .args(["favorites", "add", "44013"])
        .assert()
        .success();

    buoy(dir.path())
        .args(["favorites", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[0] 44013 Boston"));
}

#[test]
fn unknown_favorite_fails() {
    let dir = tempdir().unwrap();
    buoy(dir.path())
        .args(["favorites", "add", "99999"])
        .assert()
        .failure();
}

#[test]
fn station_in_english_units() {
    let dir = tempdir().unwrap();
    buoy(dir.path())
        .args(["settings", "units", "english"])
        .assert()
        .success();

    buoy(dir.path())
        .args(["station", "44097"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Air Temperature: 50.00 °F"));
}
