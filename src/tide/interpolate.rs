//! Height and trend between two tabulated tide events.
//!
//! ## Algorithm
//! 1. Pool the station's events from the query day and both neighbouring days,
//!    so queries near midnight still see the event on the other side
//! 2. Sort ascending and find `prev` (last event at or before the query) and
//!    `next` (first event strictly after it)
//! 3. Blend with a half cosine when the two are at most `max_gap` apart:
//!    ```text
//!    f  = (t - t_prev) / (t_next - t_prev)
//!    mu = (1 - cos(f·π)) / 2
//!    h  = h_prev·(1 - mu) + h_next·mu
//!    ```
//!    The curve passes through both extrema with zero slope, which is how the
//!    water behaves at high and low slack. It is a smooth approximation, not a
//!    harmonic prediction.
//!
//! ## Degraded Cases
//! | Situation                        | Height          | Trend        |
//! |----------------------------------|-----------------|--------------|
//! | gap between events > `max_gap`   | `prev` height   | `Stable`     |
//! | only `prev` or only `next`       | that height     | `Stable`     |
//! | no events at all                 | `None`          | `None`       |
//!
//! Within a normal bracket the trend follows `next.kind`: rising towards a
//! high, falling towards a low.

use super::{TideEvent, TideKind, TideQueryResult, TideSource, Trend};
use chrono::{Duration, NaiveDateTime};
use log::debug;

/// Default largest bracket that is still interpolated.
pub const DEFAULT_MAX_BRACKET_GAP_HOURS: i64 = 8;

/// Half-cosine blend of two heights; `fraction` runs 0 → 1 from `h_prev` to `h_next`.
pub fn cosine_blend(h_prev: f64, h_next: f64, fraction: f64) -> f64 {
    let mu = (1.0 - (fraction * std::f64::consts::PI).cos()) / 2.0;
    h_prev * (1.0 - mu) + h_next * mu
}

/// Interpolation settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TideInterpolator {
    /// Brackets wider than this are treated as a hole in the data
    pub max_gap: Duration,
}

impl Default for TideInterpolator {
    fn default() -> Self {
        TideInterpolator {
            max_gap: Duration::hours(DEFAULT_MAX_BRACKET_GAP_HOURS),
        }
    }
}

impl TideInterpolator {
    pub fn new(max_gap: Duration) -> Self {
        TideInterpolator { max_gap }
    }

    /// Collect the station's events around `at` (previous, same and next
    /// calendar day), sorted ascending.
    pub fn pooled_events(&self, source: &dyn TideSource, key: &str, at: NaiveDateTime) -> Vec<TideEvent> {
        let day = at.date();
        let mut events = Vec::new();
        for d in [day.pred_opt(), Some(day), day.succ_opt()].into_iter().flatten() {
            events.extend(source.events_on(key, d));
        }
        events.sort_by_key(|e| e.timestamp);
        events
    }

    /// Estimate height and trend at `at` from `events`, which must be sorted
    /// by timestamp.
    pub fn estimate(&self, events: &[TideEvent], at: NaiveDateTime) -> TideQueryResult {
        let split = events.partition_point(|e| e.timestamp <= at);
        let prev = split.checked_sub(1).and_then(|i| events.get(i));
        let next = events.get(split);

        match (prev, next) {
            (Some(prev), Some(next)) => {
                let span = next.timestamp - prev.timestamp;
                if span > self.max_gap {
                    debug!(
                        "Tide bracket {} .. {} exceeds {}h, holding last height",
                        prev.timestamp,
                        next.timestamp,
                        self.max_gap.num_hours()
                    );
                    return stable(prev.height);
                }

                let fraction = (at - prev.timestamp).num_milliseconds() as f64
                    / span.num_milliseconds() as f64;
                let trend = match next.kind {
                    TideKind::High => Trend::Rising,
                    TideKind::Low => Trend::Falling,
                };
                TideQueryResult {
                    height: Some(cosine_blend(prev.height, next.height, fraction)),
                    trend: Some(trend),
                }
            }
            (Some(only), None) | (None, Some(only)) => stable(only.height),
            (None, None) => TideQueryResult::ABSENT,
        }
    }

    /// Pool and estimate in one step.
    pub fn height_and_trend_at(&self, source: &dyn TideSource, key: &str, at: NaiveDateTime) -> TideQueryResult {
        let events = self.pooled_events(source, key, at);
        self.estimate(&events, at)
    }
}

fn stable(height: f64) -> TideQueryResult {
    TideQueryResult {
        height: Some(height),
        trend: Some(Trend::Stable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tide::{FlatTideRecord, FlatTideTable};
    use chrono::NaiveDate;

    fn base() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap()
    }

    fn event(offset_minutes: i64, height: f64, kind: TideKind) -> TideEvent {
        TideEvent {
            station_key: "Test".to_string(),
            timestamp: base() + Duration::minutes(offset_minutes),
            height,
            kind,
        }
    }

    fn bracket() -> Vec<TideEvent> {
        vec![event(0, 1.0, TideKind::Low), event(360, 3.0, TideKind::High)]
    }

    fn at(offset_minutes: i64) -> NaiveDateTime {
        base() + Duration::minutes(offset_minutes)
    }

    #[test]
    fn reproduces_extrema_and_midpoint() {
        let interp = TideInterpolator::default();
        let events = bracket();

        let start = interp.estimate(&events, at(0));
        assert!((start.height.unwrap() - 1.0).abs() < 1e-12);

        let mid = interp.estimate(&events, at(180));
        assert!((mid.height.unwrap() - 2.0).abs() < 1e-12);
        assert_eq!(mid.trend, Some(Trend::Rising));

        // At exactly t_next the event becomes `prev` and no `next` remains
        let end = interp.estimate(&events, at(360));
        assert!((end.height.unwrap() - 3.0).abs() < 1e-12);
        assert_eq!(end.trend, Some(Trend::Stable));

        assert!((cosine_blend(1.0, 3.0, 1.0) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn interior_trend_follows_next_kind() {
        let interp = TideInterpolator::default();
        let events = vec![event(0, 2.5, TideKind::High), event(370, 0.4, TideKind::Low)];
        for minute in [1, 100, 200, 369] {
            assert_eq!(interp.estimate(&events, at(minute)).trend, Some(Trend::Falling));
        }
        let events = bracket();
        for minute in [1, 100, 200, 359] {
            assert_eq!(interp.estimate(&events, at(minute)).trend, Some(Trend::Rising));
        }
    }

    #[test]
    fn never_leaves_the_bracket_range() {
        for (h1, h2) in [(1.0, 3.0), (2.4, -0.3), (0.0, 0.0), (1.7, 1.2)] {
            let lo = f64::min(h1, h2);
            let hi = f64::max(h1, h2);
            for step in 0..=100 {
                let h = cosine_blend(h1, h2, step as f64 / 100.0);
                assert!(h >= lo - 1e-12 && h <= hi + 1e-12, "{} outside [{}, {}]", h, lo, hi);
            }
        }
    }

    #[test]
    fn wide_gap_holds_previous_height() {
        let interp = TideInterpolator::default();
        let events = vec![event(0, 1.2, TideKind::Low), event(9 * 60, 2.8, TideKind::High)];
        let result = interp.estimate(&events, at(120));
        assert_eq!(result.height, Some(1.2));
        assert_eq!(result.trend, Some(Trend::Stable));

        // Exactly eight hours is still interpolated
        let events = vec![event(0, 1.0, TideKind::Low), event(8 * 60, 3.0, TideKind::High)];
        let result = interp.estimate(&events, at(4 * 60));
        assert!((result.height.unwrap() - 2.0).abs() < 1e-12);
        assert_eq!(result.trend, Some(Trend::Rising));
    }

    #[test]
    fn one_sided_and_empty_windows() {
        let interp = TideInterpolator::default();
        let events = bracket();

        let before = interp.estimate(&events, at(-30));
        assert_eq!(before.height, Some(1.0));
        assert_eq!(before.trend, Some(Trend::Stable));

        let after = interp.estimate(&events, at(400));
        assert_eq!(after.height, Some(3.0));
        assert_eq!(after.trend, Some(Trend::Stable));

        assert_eq!(interp.estimate(&[], at(0)), TideQueryResult::ABSENT);
    }

    #[test]
    fn pools_neighbouring_days_across_midnight() {
        let day = |d| NaiveDate::from_ymd_opt(2025, 3, d).unwrap();
        let table = FlatTideTable::from_records(vec![
            FlatTideRecord {
                station_name: "Itajaí".into(),
                date: day(10),
                time: "22:00".into(),
                height: 0.2,
                kind: TideKind::Low,
            },
            FlatTideRecord {
                station_name: "Itajaí".into(),
                date: day(11),
                time: "4:00".into(),
                height: 1.0,
                kind: TideKind::High,
            },
            FlatTideRecord {
                station_name: "Itajaí".into(),
                date: day(20),
                time: "4:00".into(),
                height: 9.9,
                kind: TideKind::High,
            },
        ]);
        let interp = TideInterpolator::default();
        let query = day(11).and_hms_opt(1, 0, 0).unwrap();

        let pooled = interp.pooled_events(&table, "Itajaí", query);
        assert_eq!(pooled.len(), 2);

        let result = interp.height_and_trend_at(&table, "Itajaí", query);
        assert!((result.height.unwrap() - 0.6).abs() < 1e-12);
        assert_eq!(result.trend, Some(Trend::Rising));
    }
}
