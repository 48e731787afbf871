//! # Coordinate Utilities
//!
//! Conversions between the textual forms navigators type or read off a chart
//! and the decimal degrees every other module works in.
//!
//! ## Accepted Input
//! [`parse_dms`] is deliberately forgiving about separators, since positions are
//! copied from charts, pilot books and GPS screens:
//! ```text
//! 04°25.86' N      23 30 S      046º 18' 36" W      25,583 S
//! ```
//! Degrees are required; minutes and seconds are optional. A hemisphere letter
//! of `S` or `W` makes the value negative.
//!
//! ## Failure
//! Unreadable text is reported as a [`CoordError`] rather than as `0.0`, which
//! would be indistinguishable from a position on the equator or prime meridian.

use log::warn;
use thiserror::Error;

/// Errors produced while reading or validating a coordinate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoordError {
    /// Nothing to parse after trimming
    #[error("empty coordinate")]
    Empty,

    /// A degree, minute or second field is not a number
    #[error("invalid number '{0}' in coordinate")]
    InvalidNumber(String),

    /// More than degrees, minutes and seconds were given
    #[error("too many fields in coordinate '{0}'")]
    TooManyParts(String),

    /// Minutes must lie in [0, 60)
    #[error("minutes {0} out of range")]
    MinutesOutOfRange(f64),

    /// Seconds must lie in [0, 60)
    #[error("seconds {0} out of range")]
    SecondsOutOfRange(f64),

    /// Value does not fit the axis (±90 latitude, ±180 longitude)
    #[error("{axis:?} {value} out of range")]
    OutOfRange { axis: Axis, value: f64 },
}

/// Which coordinate a value belongs to; selects the hemisphere letters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    /// North/south, ±90°
    Latitude,
    /// East/west, ±180°
    Longitude,
}

impl Axis {
    fn limit(self) -> f64 {
        match self {
            Axis::Latitude => 90.0,
            Axis::Longitude => 180.0,
        }
    }

    fn suffix(self, value: f64) -> char {
        match (self, value >= 0.0) {
            (Axis::Latitude, true) => 'N',
            (Axis::Latitude, false) => 'S',
            (Axis::Longitude, true) => 'E',
            (Axis::Longitude, false) => 'W',
        }
    }
}

/// Degrees to radians.
pub fn to_radians(degrees: f64) -> f64 {
    degrees * std::f64::consts::PI / 180.0
}

/// Reject non-finite values and values outside the axis range.
pub fn check_range(value: f64, axis: Axis) -> Result<f64, CoordError> {
    if value.is_finite() && value.abs() <= axis.limit() {
        Ok(value)
    } else {
        Err(CoordError::OutOfRange { axis, value })
    }
}

/// Parse a degrees/minutes/seconds string into decimal degrees.
///
/// Separators (`°`, `º`, `'`, `’`, `"`, whitespace) are interchangeable and a
/// comma may be used as the decimal point. Without a hemisphere letter a
/// leading minus sign on the degrees is honoured.
///
/// # Example
/// ```
/// use voyage_nav_lib::coords::parse_dms;
///
/// let lat = parse_dms("23°30' S").unwrap();
/// assert!((lat + 23.5).abs() < 1e-9);
/// assert!(parse_dms("north-ish").is_err());
/// ```
pub fn parse_dms(text: &str) -> Result<f64, CoordError> {
    let result = parse_dms_fields(text);
    if let Err(ref e) = result {
        warn!("Could not parse coordinate '{}': {}", text, e);
    }
    result
}

fn parse_dms_fields(text: &str) -> Result<f64, CoordError> {
    let cleaned: String = text
        .trim()
        .to_uppercase()
        .chars()
        .map(|c| match c {
            '°' | 'º' | '\'' | '’' | '"' | '′' | '″' => ' ',
            ',' => '.',
            other => other,
        })
        .collect();

    let mut negative = cleaned.contains('S') || cleaned.contains('W');
    let numeric: String = cleaned
        .chars()
        .filter(|c| !matches!(c, 'N' | 'S' | 'E' | 'W'))
        .collect();

    let parts: Vec<&str> = numeric.split_whitespace().collect();
    if parts.is_empty() {
        return Err(CoordError::Empty);
    }
    if parts.len() > 3 {
        return Err(CoordError::TooManyParts(text.trim().to_string()));
    }

    let number = |s: &str| {
        s.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| CoordError::InvalidNumber(s.to_string()))
    };

    let mut degrees = number(parts[0])?;
    if degrees < 0.0 {
        negative = true;
        degrees = -degrees;
    }

    let minutes = match parts.get(1) {
        Some(s) => number(s)?,
        None => 0.0,
    };
    if !(0.0..60.0).contains(&minutes) {
        return Err(CoordError::MinutesOutOfRange(minutes));
    }

    let seconds = match parts.get(2) {
        Some(s) => number(s)?,
        None => 0.0,
    };
    if !(0.0..60.0).contains(&seconds) {
        return Err(CoordError::SecondsOutOfRange(seconds));
    }

    let value = degrees + minutes / 60.0 + seconds / 3600.0;
    Ok(if negative { -value } else { value })
}

/// Parse a position typed by hand: plain decimal degrees, or anything
/// [`parse_dms`] understands. The result is range-checked for `axis`.
pub fn parse_position(text: &str, axis: Axis) -> Result<f64, CoordError> {
    let trimmed = text.trim();
    let value = match trimmed.parse::<f64>() {
        Ok(v) => v,
        Err(_) => parse_dms(trimmed)?,
    };
    check_range(value, axis)
}

/// Render decimal degrees as `D° MM.MMM' H`.
///
/// # Example
/// ```
/// use voyage_nav_lib::coords::{format_position, Axis};
///
/// assert_eq!(format_position(-23.5, Axis::Latitude), "23° 30.000' S");
/// assert_eq!(format_position(46.31, Axis::Longitude), "46° 18.600' E");
/// ```
pub fn format_position(value: f64, axis: Axis) -> String {
    let abs = value.abs();
    let mut degrees = abs.floor();
    // Rounded to printed precision; a result of 60.000 carries into the degrees
    let mut minutes = ((abs - degrees) * 60.0 * 1000.0).round() / 1000.0;
    if minutes >= 60.0 {
        degrees += 1.0;
        minutes = 0.0;
    }
    format!("{}° {:.3}' {}", degrees as i64, minutes, axis.suffix(value))
}
