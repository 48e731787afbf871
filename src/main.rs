//! # Voyage Planner Command Line
//!
//! A thin front end over `voyage_nav_lib`: reads already-structured JSON
//! records, runs one computation and prints the result as plain text.
//!
//! ```text
//! voyage-planner [--config <path>] leg <lat1> <lon1> <lat2> <lon2>
//! voyage-planner [--config <path>] route <ports.json> <segments.json> <origin-id> <dest-id>
//! voyage-planner [--config <path>] tide <tides.json> <station> <YYYY-MM-DDTHH:MM> [ports.json]
//! voyage-planner [--config <path>] match <ports.json> <track.json>
//! voyage-planner [--config <path>] locate <stations.json> <lat> <lon>
//! ```
//!
//! Logging goes to stderr through `env_logger`; set `RUST_LOG=debug` for detail.

// Test modules
#[cfg(test)]
mod tests;

use anyhow::{bail, Context};
use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use std::env;
use std::fs;
use std::path::Path;
use voyage_nav_lib::config::Config;
use voyage_nav_lib::coords::{format_position, parse_position, Axis};
use voyage_nav_lib::loxodrome::leg_between;
use voyage_nav_lib::ports::{EndpointPorts, PortMatch, PortRegistry};
use voyage_nav_lib::route_graph::{find_route, RouteError, RouteSegment};
use voyage_nav_lib::tide::{
    locate_station, ReferenceStation, StationLocation, TideQueryResult, TideService, TideTable, Trend,
};
use voyage_nav_lib::voyage::{legs, VoyageSummary};
use voyage_nav_lib::GeoPoint;

const USAGE: &str = "usage: voyage-planner [--config <path>] <command>

commands:
  leg <lat1> <lon1> <lat2> <lon2>
  route <ports.json> <segments.json> <origin-id> <dest-id>
  tide <tides.json> <station> <YYYY-MM-DDTHH:MM> [ports.json]
  match <ports.json> <track.json>
  locate <stations.json> <lat> <lon>";

/// Read and deserialize a JSON file.
fn read_json<T: DeserializeOwned>(path: &str) -> anyhow::Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path))
}

fn parse_point(lat: &str, lon: &str) -> anyhow::Result<GeoPoint> {
    let lat = parse_position(lat, Axis::Latitude).with_context(|| format!("latitude '{}'", lat))?;
    let lon = parse_position(lon, Axis::Longitude).with_context(|| format!("longitude '{}'", lon))?;
    Ok(GeoPoint::new(lat, lon))
}

fn describe(point: &GeoPoint) -> String {
    format!(
        "{}  {}",
        format_position(point.lat, Axis::Latitude),
        format_position(point.lon, Axis::Longitude)
    )
}

/// Text for a tide reading; "no data" never prints as a height.
fn describe_tide(result: &TideQueryResult) -> String {
    match (result.height, result.trend) {
        (Some(height), Some(trend)) => format!("{:.2} m {}", height, trend_label(trend)),
        (Some(height), None) => format!("{:.2} m", height),
        (None, _) => "no data".to_string(),
    }
}

fn trend_label(trend: Trend) -> &'static str {
    match trend {
        Trend::Rising => "rising",
        Trend::Falling => "falling",
        Trend::Stable => "stable",
    }
}

fn describe_match(port_match: Option<&PortMatch<'_>>) -> String {
    match port_match {
        Some(m) => format!("{} ({}), {:.1} NM", m.port.name, m.port.id, m.distance_nm),
        None => "no port in range".to_string(),
    }
}

/// Departure and arrival lines for a matched track.
fn describe_endpoints(endpoints: &EndpointPorts<'_>) -> [String; 2] {
    [
        format!("Departure: {}", describe_match(endpoints.departure.as_ref())),
        format!("Arrival:   {}", describe_match(endpoints.arrival.as_ref())),
    ]
}

fn describe_location(location: &StationLocation<'_>) -> String {
    match location {
        StationLocation::Coastal { station, distance_nm } => format!(
            "{} ({:.1} NM), table '{}'",
            station.name, distance_nm, station.table_key
        ),
        StationLocation::Oceanic { distance_nm } if distance_nm.is_finite() => format!(
            "open water, nearest station {:.1} NM away",
            distance_nm
        ),
        StationLocation::Oceanic { .. } => "open water, no reference stations".to_string(),
    }
}

fn run_leg(args: &[String]) -> anyhow::Result<()> {
    let [lat1, lon1, lat2, lon2] = args else {
        bail!("leg needs four coordinates\n\n{}", USAGE);
    };
    let from = parse_point(lat1, lon1)?;
    let to = parse_point(lat2, lon2)?;
    let leg = leg_between(&from, &to);

    println!("From:     {}", describe(&from));
    println!("To:       {}", describe(&to));
    println!("Course:   {:05.1}°", leg.course);
    println!("Distance: {:.2} NM", leg.distance);
    Ok(())
}

fn run_route(args: &[String], config: &Config) -> anyhow::Result<()> {
    let [ports_path, segments_path, origin, destination] = args else {
        bail!("route needs ports, segments, origin and destination\n\n{}", USAGE);
    };
    let ports: PortRegistry = read_json(ports_path)?;
    let segments: Vec<RouteSegment> = read_json(segments_path)?;

    let route = match find_route(
        origin,
        destination,
        &segments,
        &ports,
        config.routing.snap_threshold_nm,
    ) {
        Ok(route) => route,
        Err(e @ RouteError::NoConnection { .. }) => {
            let reason = if e.is_isolated() {
                "no recorded track starts or ends near one of the ports"
            } else {
                "the recorded tracks do not link the two ports"
            };
            bail!(
                "{}: {} (snap radius {} NM)",
                e,
                reason,
                config.routing.snap_threshold_nm
            );
        }
        Err(e) => return Err(e.into()),
    };

    println!("Segments: {}", route.segment_ids.join(" -> "));
    println!();
    for row in legs(&route.waypoints) {
        println!(
            "{:>3} {:<10} {}  {:05.1}°  {:7.2} NM",
            row.from.sequence,
            row.from.name,
            describe(&row.from.point),
            row.leg.course,
            row.leg.distance
        );
    }
    if let Some(last) = route.waypoints.last() {
        println!("{:>3} {:<10} {}", last.sequence, last.name, describe(&last.point));
    }

    if let Some(summary) = VoyageSummary::compute(&route.waypoints, &config.vessel) {
        println!();
        println!("Total:    {:.1} NM, {} waypoints", summary.total_distance_nm, summary.waypoint_count);
        match summary.duration_hours {
            Some(hours) => println!("Passage:  {:.1} h at {} kn", hours, config.vessel.speed_knots),
            None => println!("Passage:  unknown (no planning speed)"),
        }
        if let Some(fuel) = summary.fuel {
            println!(
                "Fuel:     {:.0} L required, {:.0} L remaining",
                fuel.required_l, fuel.remaining_l
            );
        }
    }
    Ok(())
}

fn run_tide(args: &[String], config: &Config) -> anyhow::Result<()> {
    let (tides_path, station, at, ports_path) = match args {
        [tides, station, at] => (tides, station, at, None),
        [tides, station, at, ports] => (tides, station, at, Some(ports)),
        _ => bail!("tide needs a table, a station and an instant\n\n{}", USAGE),
    };
    let at = NaiveDateTime::parse_from_str(at, "%Y-%m-%dT%H:%M")
        .with_context(|| format!("instant '{}', expected YYYY-MM-DDTHH:MM", at))?;

    let text = fs::read_to_string(tides_path).with_context(|| format!("reading {}", tides_path))?;
    let table = TideTable::from_json_str(&text).with_context(|| format!("loading {}", tides_path))?;
    let ports: PortRegistry = match ports_path {
        Some(path) => read_json(path)?,
        None => PortRegistry::default(),
    };

    let mut service: TideService = config.tide.service()?;
    if !service.install(1, table) {
        bail!("tide table from {} was not installed", tides_path);
    }

    let Some(key) = service.resolve_station_key(&ports, station) else {
        println!("{}: no data (station not found in {})", station, tides_path);
        return Ok(());
    };

    let reading = service.height_and_trend_at(&key, at);
    println!("Station: {}", key);
    println!("{}: {}", at.format("%Y-%m-%d %H:%M"), describe_tide(&reading));

    let curve = service.curve(
        &key,
        at,
        config.tide.curve_half_window(),
        config.tide.curve_step(),
    );
    if !curve.is_empty() {
        println!();
        for point in curve {
            let marker = if point.is_center { "<" } else { "" };
            println!("  {}  {:5.2} m {}", point.at.format("%H:%M"), point.height, marker);
        }
    }
    Ok(())
}

fn run_match(args: &[String], config: &Config) -> anyhow::Result<()> {
    let [ports_path, track_path] = args else {
        bail!("match needs ports and a track\n\n{}", USAGE);
    };
    let ports: PortRegistry = read_json(ports_path)?;
    let track: Vec<GeoPoint> = read_json(track_path)?;
    if track.len() < 2 {
        bail!("{} has {} point(s), a track needs two", track_path, track.len());
    }

    let endpoints = ports.match_track_endpoints(&track, config.routing.endpoint_match_nm);
    for line in describe_endpoints(&endpoints) {
        println!("{}", line);
    }
    Ok(())
}

fn run_locate(args: &[String], config: &Config) -> anyhow::Result<()> {
    let [stations_path, lat, lon] = args else {
        bail!("locate needs stations and a position\n\n{}", USAGE);
    };
    let stations: Vec<ReferenceStation> = read_json(stations_path)?;
    let point = parse_point(lat, lon)?;

    let location = locate_station(&point, &stations, config.tide.station_radius_nm);
    println!("Position: {}", describe(&point));
    println!("Station:  {}", describe_location(&location));
    Ok(())
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();

    let config = if args.first().map(String::as_str) == Some("--config") {
        if args.len() < 2 {
            bail!("--config needs a path\n\n{}", USAGE);
        }
        let path = args.remove(1);
        args.remove(0);
        Config::load_from_path(Path::new(&path))
    } else {
        Config::load()
    };

    let Some((command, rest)) = args.split_first() else {
        eprintln!("{}", USAGE);
        return Ok(());
    };

    match command.as_str() {
        "leg" => run_leg(rest),
        "route" => run_route(rest, &config),
        "tide" => run_tide(rest, &config),
        "match" => run_match(rest, &config),
        "locate" => run_locate(rest, &config),
        other => bail!("unknown command '{}'\n\n{}", other, USAGE),
    }
}
