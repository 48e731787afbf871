//! Nearest tide reference station for an arbitrary position.
//!
//! A position within the radius of a station is coastal and takes that
//! station's table; anything farther out is open water with no tide reference.
//! Distance here is great-circle (haversine), not rhumb line.

use crate::loxodrome::great_circle_distance;
use crate::GeoPoint;
use log::debug;
use serde::{Deserialize, Serialize};

/// Default radius within which a station is used as reference.
pub const DEFAULT_STATION_RADIUS_NM: f64 = 30.0;

/// A tide gauge location and the table key its readings are filed under.
///
/// Several stations may share one `table_key` when a nearby gauge stands in
/// for one that has no published table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReferenceStation {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub point: GeoPoint,
    pub table_key: String,
}

/// Outcome of [`locate_station`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StationLocation<'a> {
    /// Within the radius of `station`
    Coastal {
        station: &'a ReferenceStation,
        distance_nm: f64,
    },
    /// Beyond every station's radius; `distance_nm` is to the nearest one
    Oceanic { distance_nm: f64 },
}

impl<'a> StationLocation<'a> {
    /// The reference station, when coastal.
    pub fn station(&self) -> Option<&'a ReferenceStation> {
        match self {
            StationLocation::Coastal { station, .. } => Some(*station),
            StationLocation::Oceanic { .. } => None,
        }
    }

    pub fn distance_nm(&self) -> f64 {
        match self {
            StationLocation::Coastal { distance_nm, .. } | StationLocation::Oceanic { distance_nm } => *distance_nm,
        }
    }
}

/// Find the nearest station to `point`; coastal when it is at most
/// `radius_nm` away.
pub fn locate_station<'a>(
    point: &GeoPoint,
    stations: &'a [ReferenceStation],
    radius_nm: f64,
) -> StationLocation<'a> {
    let mut nearest: Option<(&ReferenceStation, f64)> = None;
    for station in stations {
        let distance = great_circle_distance(point, &station.point);
        if nearest.map_or(true, |(_, best)| distance < best) {
            nearest = Some((station, distance));
        }
    }

    match nearest {
        Some((station, distance_nm)) if distance_nm <= radius_nm => {
            debug!("Tide reference {} at {:.1} NM", station.name, distance_nm);
            StationLocation::Coastal { station, distance_nm }
        }
        Some((_, distance_nm)) => StationLocation::Oceanic { distance_nm },
        None => StationLocation::Oceanic {
            distance_nm: f64::INFINITY,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stations() -> Vec<ReferenceStation> {
        vec![
            ReferenceStation {
                id: "BR_PNG".into(),
                name: "Paranaguá (Galheta)".into(),
                point: GeoPoint::new(-25.583, -48.316),
                table_key: "Paranaguá".into(),
            },
            ReferenceStation {
                id: "BR_ITJ".into(),
                name: "Itajaí".into(),
                point: GeoPoint::new(-26.916, -48.650),
                table_key: "Itajaí".into(),
            },
        ]
    }

    #[test]
    fn picks_nearest_within_radius() {
        let stations = stations();
        let location = locate_station(&GeoPoint::new(-26.8, -48.6), &stations, DEFAULT_STATION_RADIUS_NM);
        assert_eq!(location.station().map(|s| s.id.as_str()), Some("BR_ITJ"));
        assert!(location.distance_nm() < 10.0);
    }

    #[test]
    fn far_offshore_is_oceanic() {
        let stations = stations();
        let location = locate_station(&GeoPoint::new(-26.9, -45.0), &stations, DEFAULT_STATION_RADIUS_NM);
        assert!(matches!(location, StationLocation::Oceanic { .. }));
        assert!(location.distance_nm() > 100.0);
        assert!(location.station().is_none());
    }

    #[test]
    fn radius_is_inclusive() {
        let stations = stations();
        let point = GeoPoint::new(-26.0, -48.5);
        let exact = great_circle_distance(&point, &stations[0].point);
        assert!(locate_station(&point, &stations, exact).station().is_some());
        assert!(locate_station(&point, &stations, exact - 1e-6).station().is_none());
    }

    #[test]
    fn no_stations_is_oceanic_at_infinity() {
        let location = locate_station(&GeoPoint::new(0.0, 0.0), &[], DEFAULT_STATION_RADIUS_NM);
        assert_eq!(
            location,
            StationLocation::Oceanic {
                distance_nm: f64::INFINITY
            }
        );
    }
}
