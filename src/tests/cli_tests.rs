//! # Command Line Output
//!
//! The `match` and `locate` commands read their radii from `Config`; these
//! checks drive the same calls and the text the commands print.

use crate::{describe_endpoints, describe_location};
use voyage_nav_lib::config::Config;
use voyage_nav_lib::ports::PortRegistry;
use voyage_nav_lib::tide::{locate_station, ReferenceStation};
use voyage_nav_lib::GeoPoint;

const PORTS: &str = r#"[
    { "id": "BR_SSZ", "name": "Santos-SP",    "lat": -23.960, "lon": -46.310 },
    { "id": "BR_PNG", "name": "Paranaguá-PR", "lat": -25.583, "lon": -48.316 }
]"#;

const STATIONS: &str = r#"[
    { "id": "BR_PNG", "name": "Paranaguá (Galheta)", "lat": -25.583, "lon": -48.316, "table_key": "Paranaguá" }
]"#;

#[test]
fn match_uses_configured_endpoint_radius() {
    let ports: PortRegistry = serde_json::from_str(PORTS).unwrap();
    // Starts about 5 NM off Santos, ends about 25 NM off Paranaguá
    let track = vec![
        GeoPoint::new(-24.040, -46.280),
        GeoPoint::new(-24.900, -47.300),
        GeoPoint::new(-25.583, -47.856),
    ];

    let mut config = Config::default();
    let endpoints = ports.match_track_endpoints(&track, config.routing.endpoint_match_nm);
    let [departure, arrival] = describe_endpoints(&endpoints);
    assert!(departure.starts_with("Departure: Santos-SP (BR_SSZ)"), "{}", departure);
    assert_eq!(arrival, "Arrival:   no port in range");

    config.routing.endpoint_match_nm = 40.0;
    let endpoints = ports.match_track_endpoints(&track, config.routing.endpoint_match_nm);
    let [_, arrival] = describe_endpoints(&endpoints);
    assert!(arrival.starts_with("Arrival:   Paranaguá-PR (BR_PNG)"), "{}", arrival);
}

#[test]
fn locate_uses_configured_station_radius() {
    let stations: Vec<ReferenceStation> = serde_json::from_str(STATIONS).unwrap();
    // About 40 NM east of the gauge
    let point = GeoPoint::new(-25.583, -47.576);

    let mut config = Config::default();
    let location = locate_station(&point, &stations, config.tide.station_radius_nm);
    assert!(describe_location(&location).starts_with("open water, nearest station"));

    config.tide.station_radius_nm = 50.0;
    let location = locate_station(&point, &stations, config.tide.station_radius_nm);
    let text = describe_location(&location);
    assert!(text.starts_with("Paranaguá (Galheta)"), "{}", text);
    assert!(text.ends_with("table 'Paranaguá'"), "{}", text);

    let nowhere = locate_station(&point, &[], config.tide.station_radius_nm);
    assert_eq!(describe_location(&nowhere), "open water, no reference stations");
}
