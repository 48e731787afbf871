//! Flat tide table: one record per high/low water, keyed by exact station name.

use super::{local_instant, TideEvent, TideKind, TideSource};
use chrono::NaiveDate;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of a flat tide table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlatTideRecord {
    /// Exact station name as filed in the table
    pub station_name: String,
    /// Calendar day of the event
    pub date: NaiveDate,
    /// Local clock time, `H:MM` or `HH:MM[:SS]`
    pub time: String,
    /// Height in metres
    pub height: f64,
    /// High or low water
    pub kind: TideKind,
}

/// Tide events grouped by station, then by calendar day.
#[derive(Clone, Debug, Default)]
pub struct FlatTideTable {
    stations: BTreeMap<String, BTreeMap<NaiveDate, Vec<TideEvent>>>,
}

impl FlatTideTable {
    /// Group records by station and day. Records with an unreadable time or
    /// a non-finite height are skipped with a warning.
    pub fn from_records(records: Vec<FlatTideRecord>) -> Self {
        let mut stations: BTreeMap<String, BTreeMap<NaiveDate, Vec<TideEvent>>> = BTreeMap::new();
        let total = records.len();
        let mut kept = 0usize;

        for record in records {
            let Some(timestamp) = local_instant(record.date, &record.time) else {
                warn!(
                    "Skipping {} record on {}: bad time '{}'",
                    record.station_name, record.date, record.time
                );
                continue;
            };
            if !record.height.is_finite() {
                warn!(
                    "Skipping {} record at {}: bad height",
                    record.station_name, timestamp
                );
                continue;
            }

            stations
                .entry(record.station_name.clone())
                .or_default()
                .entry(record.date)
                .or_default()
                .push(TideEvent {
                    station_key: record.station_name,
                    timestamp,
                    height: record.height,
                    kind: record.kind,
                });
            kept += 1;
        }

        for days in stations.values_mut() {
            for events in days.values_mut() {
                events.sort_by_key(|e| e.timestamp);
            }
        }

        info!(
            "Flat tide table: {} of {} records across {} stations",
            kept,
            total,
            stations.len()
        );
        FlatTideTable { stations }
    }

    /// Number of stations loaded.
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

impl TideSource for FlatTideTable {
    fn station_keys(&self) -> Vec<&str> {
        self.stations.keys().map(String::as_str).collect()
    }

    fn has_station(&self, key: &str) -> bool {
        self.stations.contains_key(key)
    }

    fn events_on(&self, key: &str, day: NaiveDate) -> Vec<TideEvent> {
        self.stations
            .get(key)
            .and_then(|days| days.get(&day))
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(station: &str, date: (i32, u32, u32), time: &str, height: f64, kind: TideKind) -> FlatTideRecord {
        FlatTideRecord {
            station_name: station.to_string(),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            time: time.to_string(),
            height,
            kind,
        }
    }

    #[test]
    fn groups_by_station_and_day_in_time_order() {
        let table = FlatTideTable::from_records(vec![
            record("Recife", (2025, 3, 10), "16:40", 2.1, TideKind::High),
            record("Recife", (2025, 3, 10), "4:10", 2.0, TideKind::High),
            record("Recife", (2025, 3, 11), "5:00", 2.0, TideKind::High),
            record("Salvador", (2025, 3, 10), "9:00", 0.3, TideKind::Low),
        ]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.station_keys(), vec!["Recife", "Salvador"]);

        let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let events = table.events_on("Recife", day);
        assert_eq!(events.len(), 2);
        assert!(events[0].timestamp < events[1].timestamp);
        assert_eq!(events[0].station_key, "Recife");
    }

    #[test]
    fn unknown_station_or_day_is_empty() {
        let table = FlatTideTable::from_records(vec![record(
            "Recife",
            (2025, 3, 10),
            "4:10",
            2.0,
            TideKind::High,
        )]);
        let day = NaiveDate::from_ymd_opt(2025, 3, 12).unwrap();
        assert!(table.events_on("Recife", day).is_empty());
        assert!(table.events_on("Natal", day).is_empty());
        assert!(!table.has_station("recife"));
    }

    #[test]
    fn skips_unreadable_records() {
        let table = FlatTideTable::from_records(vec![
            record("Recife", (2025, 3, 10), "4h10", 2.0, TideKind::High),
            record("Recife", (2025, 3, 10), "10:20", f64::NAN, TideKind::Low),
        ]);
        assert!(table.is_empty());
    }
}
