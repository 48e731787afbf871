//! # Loxodromic Calculator
//!
//! Course and distance along a rhumb line (constant true bearing), computed by
//! Mercator sailing. This is the leg calculation used for every consecutive
//! waypoint pair of a voyage and for the proximity tests of route stitching.
//!
//! ## Formulae
//! ```text
//! Δλ   = λ2 - λ1
//! Δφ'  = ln tan(π/4 + φ2/2) - ln tan(π/4 + φ1/2)    (meridional parts)
//! C    = atan2(Δλ, Δφ')                            normalised to [0, 360)
//! dist = |Δφ / cos C| · R                          general case
//! dist = |Δλ| · cos φ1 · R                         east–west sailing (Δφ ≈ 0)
//! ```
//! with `R = 3440.065` NM.
//!
//! ## Known Limitation
//! Meridional parts diverge as φ → ±90°, so legs touching a pole are undefined.
//! Callers validate latitudes before asking; nothing here clamps them.

use crate::coords::to_radians;
use crate::GeoPoint;
use serde::Serialize;

/// Mean Earth radius in nautical miles.
pub const EARTH_RADIUS_NM: f64 = 3440.065;

/// Latitude difference (radians) below which a leg is treated as east–west.
const PARALLEL_EPSILON: f64 = 1e-10;

/// Course and distance of a single rhumb-line leg.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Leg {
    /// True course in degrees, [0, 360)
    pub course: f64,
    /// Distance in nautical miles
    pub distance: f64,
}

/// Rhumb-line course and distance from `from` to `to`.
///
/// # Example
/// ```
/// use voyage_nav_lib::{loxodrome::leg_between, GeoPoint};
///
/// let leg = leg_between(&GeoPoint::new(0.0, 0.0), &GeoPoint::new(1.0, 0.0));
/// assert!(leg.course.abs() < 1e-9);
/// assert!((leg.distance - 60.04).abs() < 0.01);
/// ```
pub fn leg_between(from: &GeoPoint, to: &GeoPoint) -> Leg {
    let phi1 = to_radians(from.lat);
    let phi2 = to_radians(to.lat);
    let d_lat = phi2 - phi1;
    let d_lon = to_radians(to.lon - from.lon);

    let quarter = std::f64::consts::FRAC_PI_4;
    let d_phi = (quarter + phi2 / 2.0).tan().ln() - (quarter + phi1 / 2.0).tan().ln();

    // atan2 yields (-180, 180]; adding 360 before the modulo also folds -0.0 into 0.0
    let course = (d_lon.atan2(d_phi).to_degrees() + 360.0) % 360.0;

    let distance = if d_lat.abs() < PARALLEL_EPSILON {
        d_lon.abs() * phi1.cos() * EARTH_RADIUS_NM
    } else {
        (d_lat / to_radians(course).cos()).abs() * EARTH_RADIUS_NM
    };

    Leg { course, distance }
}

/// Great-circle (haversine) distance in nautical miles.
///
/// Used where only proximity matters, such as choosing the nearest tide
/// reference station; voyage legs always use [`leg_between`].
pub fn great_circle_distance(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let d_lat = to_radians(b.lat - a.lat);
    let d_lon = to_radians(b.lon - a.lon);
    let h = (d_lat / 2.0).sin().powi(2)
        + to_radians(a.lat).cos() * to_radians(b.lat).cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_NM * h.sqrt().atan2((1.0 - h).sqrt())
}
