//! # Voyage Totals
//!
//! Per-leg rows and whole-voyage figures for an ordered waypoint list: total
//! rhumb-line distance, passage time at the vessel's planning speed, arrival
//! time for a given departure, and fuel.
//!
//! Fuel is `duration × rate`; remaining on board is `stock − required` and may
//! go negative, which the caller should read as "not enough fuel".

use crate::loxodrome::{leg_between, Leg};
use crate::Waypoint;
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Planning figures of the vessel, the `[vessel]` section of the config file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VesselProfile {
    /// Planning speed over ground in knots
    pub speed_knots: f64,
    /// Fuel consumption in litres per hour; 0 disables fuel figures
    pub fuel_rate_lph: f64,
    /// Fuel on board at departure in litres
    pub fuel_stock_l: f64,
}

impl Default for VesselProfile {
    fn default() -> Self {
        VesselProfile {
            speed_knots: 10.0,
            fuel_rate_lph: 0.0,
            fuel_stock_l: 0.0,
        }
    }
}

/// One leg of the route table.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LegRow<'a> {
    pub from: &'a Waypoint,
    pub to: &'a Waypoint,
    pub leg: Leg,
}

/// Rows for every consecutive waypoint pair.
pub fn legs(waypoints: &[Waypoint]) -> Vec<LegRow<'_>> {
    waypoints
        .windows(2)
        .map(|pair| LegRow {
            from: &pair[0],
            to: &pair[1],
            leg: leg_between(&pair[0].point, &pair[1].point),
        })
        .collect()
}

/// Fuel figures, present only when a consumption rate is set.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FuelEstimate {
    pub required_l: f64,
    pub remaining_l: f64,
}

/// Whole-voyage figures.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct VoyageSummary {
    pub total_distance_nm: f64,
    pub waypoint_count: usize,
    /// Passage time in hours; `None` when the speed is not positive
    pub duration_hours: Option<f64>,
    pub fuel: Option<FuelEstimate>,
}

impl VoyageSummary {
    /// Totals for `waypoints`, or `None` when there is no leg to sail.
    pub fn compute(waypoints: &[Waypoint], vessel: &VesselProfile) -> Option<Self> {
        if waypoints.len() < 2 {
            return None;
        }

        let total_distance_nm: f64 = legs(waypoints).iter().map(|row| row.leg.distance).sum();
        let duration_hours = (vessel.speed_knots > 0.0).then(|| total_distance_nm / vessel.speed_knots);
        let fuel = duration_hours
            .filter(|_| vessel.fuel_rate_lph > 0.0)
            .map(|hours| {
                let required_l = hours * vessel.fuel_rate_lph;
                FuelEstimate {
                    required_l,
                    remaining_l: vessel.fuel_stock_l - required_l,
                }
            });

        Some(VoyageSummary {
            total_distance_nm,
            waypoint_count: waypoints.len(),
            duration_hours,
            fuel,
        })
    }

    /// Passage time as a duration, to the millisecond; `None` when it does
    /// not fit a `Duration`.
    pub fn duration(&self) -> Option<Duration> {
        self.duration_hours
            .filter(|hours| hours.is_finite())
            .and_then(|hours| Duration::try_milliseconds((hours * 3_600_000.0).round() as i64))
    }

    /// Estimated arrival for a departure at `etd`.
    pub fn eta(&self, etd: NaiveDateTime) -> Option<NaiveDateTime> {
        self.duration().and_then(|d| etd.checked_add_signed(d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GeoPoint;
    use chrono::NaiveDate;

    fn along_meridian(count: u32) -> Vec<Waypoint> {
        (0..count)
            .map(|i| Waypoint::numbered(i + 1, GeoPoint::new(i as f64, 0.0)))
            .collect()
    }

    #[test]
    fn one_row_per_consecutive_pair() {
        let waypoints = along_meridian(3);
        let rows = legs(&waypoints);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].from.name, "WPT 1");
        assert_eq!(rows[1].to.name, "WPT 3");
        assert!(legs(&waypoints[..1]).is_empty());
    }

    #[test]
    fn totals_distance_time_and_fuel() {
        let vessel = VesselProfile {
            speed_knots: 10.0,
            fuel_rate_lph: 20.0,
            fuel_stock_l: 500.0,
        };
        let summary = VoyageSummary::compute(&along_meridian(3), &vessel).unwrap();
        assert_eq!(summary.waypoint_count, 3);
        assert!((summary.total_distance_nm - 120.08).abs() < 0.02);

        let hours = summary.duration_hours.unwrap();
        assert!((hours - summary.total_distance_nm / 10.0).abs() < 1e-12);

        let fuel = summary.fuel.unwrap();
        assert!((fuel.required_l - hours * 20.0).abs() < 1e-9);
        assert!((fuel.remaining_l - (500.0 - fuel.required_l)).abs() < 1e-9);
    }

    #[test]
    fn eta_adds_passage_time() {
        let summary = VoyageSummary {
            total_distance_nm: 25.0,
            waypoint_count: 2,
            duration_hours: Some(2.5),
            fuel: None,
        };
        let etd = NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(22, 0, 0)
            .unwrap();
        let expected = NaiveDate::from_ymd_opt(2025, 3, 11)
            .unwrap()
            .and_hms_opt(0, 30, 0)
            .unwrap();
        assert_eq!(summary.eta(etd), Some(expected));
    }

    #[test]
    fn degenerate_inputs() {
        let vessel = VesselProfile::default();
        assert!(VoyageSummary::compute(&along_meridian(1), &vessel).is_none());
        assert!(VoyageSummary::compute(&[], &vessel).is_none());

        // No fuel figures without a rate
        let summary = VoyageSummary::compute(&along_meridian(2), &vessel).unwrap();
        assert!(summary.fuel.is_none());

        let stopped = VesselProfile {
            speed_knots: 0.0,
            ..VesselProfile::default()
        };
        let summary = VoyageSummary::compute(&along_meridian(2), &stopped).unwrap();
        assert_eq!(summary.duration_hours, None);
        let etd = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(summary.eta(etd), None);

        let crawling = VoyageSummary {
            duration_hours: Some(f64::INFINITY),
            ..summary
        };
        assert_eq!(crawling.duration(), None);
        assert_eq!(crawling.eta(etd), None);
    }
}
