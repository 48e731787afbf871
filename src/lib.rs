//! # Voyage Navigation Core Library
//!
//! This library holds the computational core of a coastal voyage planner: the parts
//! that do real navigation and tide work, kept free of any presentation concern.
//!
//! ## Responsibilities
//!
//! ### Loxodromic Navigation
//! - **Rhumb-line legs**: course and distance between two positions using Mercator
//!   sailing, see [`loxodrome::leg_between`]
//! - **Coordinate text**: degree/minute/second parsing and formatting, see [`coords`]
//! - **Voyage totals**: total distance, ETA and fuel over a waypoint list, see [`voyage`]
//!
//! ### Route Stitching
//! A voyage between two ports is assembled from a catalog of previously recorded
//! tracks. Track endpoints are snapped to the nearest known port, the resulting
//! port graph is searched breadth-first, and the chosen tracks are concatenated
//! (reversed where travelled backwards), see [`route_graph`].
//!
//! ### Tide Estimation
//! Tide tables only list discrete high and low water events. The height between
//! two events is reconstructed with a half-cosine blend, and a human-entered port
//! name is resolved to a table key through an exact → alias → fuzzy chain, see [`tide`].
//!
//! ## Data Flow
//! 1. **Load**: an outside collaborator deserializes ports, tracks and tide tables
//! 2. **Plan**: [`route_graph::find_route`] stitches waypoints, [`voyage`] totals them
//! 3. **Query**: [`tide::TideService`] answers height/trend per station and instant
//!
//! Nothing here performs I/O during a query and nothing reads global state: every
//! table a function needs is passed in explicitly.
//!
//! ## Core Types
//! - [`GeoPoint`]: a latitude/longitude pair in decimal degrees
//! - [`Waypoint`]: a numbered, named point of a planned route

use serde::{Deserialize, Serialize};

// Module declarations
pub mod config;
pub mod coords;
pub mod loxodrome;
pub mod ports;
pub mod route_graph;
pub mod tide;
pub mod voyage;

/// A geographic position in decimal degrees.
///
/// Plain value type: two points are the same point when their coordinates are
/// equal. Latitude is positive north, longitude positive east.
///
/// # Example
/// ```
/// use voyage_nav_lib::GeoPoint;
///
/// let santos = GeoPoint::new(-23.960, -46.310);
/// assert!(santos.lat < 0.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees, -90 to 90
    pub lat: f64,
    /// Longitude in degrees, -180 to 180
    pub lon: f64,
}

impl GeoPoint {
    /// Build a point without range checks.
    pub const fn new(lat: f64, lon: f64) -> Self {
        GeoPoint { lat, lon }
    }

    /// Build a point, rejecting non-finite or out-of-range coordinates.
    pub fn try_new(lat: f64, lon: f64) -> Result<Self, coords::CoordError> {
        coords::check_range(lat, coords::Axis::Latitude)?;
        coords::check_range(lon, coords::Axis::Longitude)?;
        Ok(GeoPoint { lat, lon })
    }
}

/// One point of a planned route.
///
/// Sequence numbers are 1-based and contiguous within a route; the order of a
/// `Vec<Waypoint>` is the order of sailing.
///
/// # Example
/// ```
/// use voyage_nav_lib::{GeoPoint, Waypoint};
///
/// let wp = Waypoint {
///     sequence: 1,
///     point: GeoPoint::new(-22.896, -43.165),
///     name: "Ilha Fiscal".to_string(),
///     source_chart: Some("1501".to_string()),
/// };
/// assert_eq!(wp.sequence, 1);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Position in the route, starting at 1
    pub sequence: u32,
    /// Where the waypoint lies
    pub point: GeoPoint,
    /// Display name, e.g. "WPT 3"
    pub name: String,
    /// Nautical chart the waypoint was taken from, when known
    #[serde(default)]
    pub source_chart: Option<String>,
}

impl Waypoint {
    /// Build an unnamed route point using the planner's default `WPT n` label.
    pub fn numbered(sequence: u32, point: GeoPoint) -> Self {
        Waypoint {
            sequence,
            point,
            name: format!("WPT {}", sequence),
            source_chart: None,
        }
    }
}
