//! Great-circle distance and proximity queries.

use crate::station::Station;
use buoy_types::{Location, UnitSystem};

/// Haversine distance between two points, in km (metric) or mi (english).
pub fn distance(a: &Location, b: &Location, units: UnitSystem) -> f64 {
    let lat_dist = (a.latitude - b.latitude).to_radians();
    let lon_dist = (a.longitude - b.longitude).to_radians();

    let h = (lat_dist / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos()
            * b.latitude.to_radians().cos()
            * (lon_dist / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    (c * units.earth_radius()).abs()
}

/// Stations strictly closer than `radius` to `location`, nearest first.
///
/// Ties keep the iteration order of `stations`.
pub fn nearby<'a, I>(
    stations: I,
    location: &Location,
    radius: f64,
    units: UnitSystem,
) -> Vec<(&'a Station, f64)>
where
    I: IntoIterator<Item = &'a Station>,
{
    let mut found: Vec<(&Station, f64)> = stations
        .into_iter()
        .map(|s| (s, s.distance_to(location, units)))
        .filter(|(_, d)| *d < radius)
        .collect();
    found.sort_by(|a, b| a.1.total_cmp(&b.1));
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use buoy_types::StationId;

    fn station(id: &str, lat: f64, lon: f64) -> Station {
        Station::new(StationId::new(id), Location::new(lat, lon))
    }

    #[test]
    fn distance_to_self_is_zero() {
        let p = Location::new(40.97, -71.13);
        assert!(distance(&p, &p, UnitSystem::Metric) < 1e-9);
    }

    #[test]
    fn distance_uses_unit_radius() {
        let a = Location::new(40.0, -70.0);
        let b = Location::new(41.0, -70.0);
        let km = distance(&a, &b, UnitSystem::Metric);
        let mi = distance(&a, &b, UnitSystem::English);
        // One degree of latitude.
        assert!((km - 111.2).abs() < 0.5, "{}", km);
        assert!((mi / km - 3961.0 / 6373.0).abs() < 1e-9);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Location::new(40.97, -71.13);
        let b = Location::new(36.61, -74.84);
        let ab = distance(&a, &b, UnitSystem::Metric);
        let ba = distance(&b, &a, UnitSystem::Metric);
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn nearby_includes_block_island_buoy() {
        let stations = vec![station("44097", 40.97, -71.13)];
        let here = Location::new(41.0, -71.0);

        let wide = nearby(&stations, &here, 50.0, UnitSystem::Metric);
        assert_eq!(wide.len(), 1);
        assert_eq!(wide[0].0.id.as_str(), "44097");

        let tight = nearby(&stations, &here, 0.001, UnitSystem::Metric);
        assert!(tight.is_empty());
    }

    #[test]
    fn nearby_sorted_ascending_and_within_radius() {
        let stations = vec![
            station("far", 42.5, -70.5),
            station("near", 41.05, -71.0),
            station("mid", 41.5, -71.2),
            station("outside", 30.0, -80.0),
        ];
        let here = Location::new(41.0, -71.0);
        let radius = 300.0;

        let found = nearby(&stations, &here, radius, UnitSystem::Metric);
        let ids: Vec<_> = found.iter().map(|(s, _)| s.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "mid", "far"]);

        for window in found.windows(2) {
            assert!(window[0].1 <= window[1].1);
        }
        assert!(found.iter().all(|(_, d)| *d < radius));
    }

    #[test]
    fn radius_is_exclusive() {
        let stations = vec![station("a", 41.0, -71.0)];
        let here = Location::new(41.0, -71.0);
        assert!(nearby(&stations, &here, 0.0, UnitSystem::Metric).is_empty());
    }
}
