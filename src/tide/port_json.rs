//! Per-port tide document: decorated port keys, each with a rolling list of
//! unlabelled tide events (plus weather samples this crate ignores).
//!
//! ```json
//! { "ports": { "Rio Grande-RS (Porto)": { "tides_7d": [
//!     { "date_iso": "2025-03-10", "time_local": "4:05", "height_m": "0,4" }
//! ] } } }
//! ```
//!
//! Heights arrive as numbers or as strings with a decimal comma. Events carry
//! no HIGH/LOW label, so one is inferred from the neighbouring event.

use super::{local_instant, TideEvent, TideKind, TideSource};
use chrono::NaiveDate;
use log::{info, warn};
use serde::Deserialize;
use std::collections::BTreeMap;

/// The document as published.
#[derive(Clone, Debug, Deserialize)]
pub struct PortTideDocument {
    pub ports: BTreeMap<String, PortTideEntry>,
}

/// One port of the document; unknown members (weather) are ignored.
#[derive(Clone, Debug, Deserialize)]
pub struct PortTideEntry {
    #[serde(default)]
    pub tides_7d: Vec<RawTideEvent>,
}

/// A tide event as written in the document.
#[derive(Clone, Debug, Deserialize)]
pub struct RawTideEvent {
    pub date_iso: NaiveDate,
    pub time_local: String,
    pub height_m: RawHeight,
}

/// Height written either as a number or as text.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum RawHeight {
    Number(f64),
    Text(String),
}

impl RawHeight {
    fn metres(&self) -> Option<f64> {
        let value = match self {
            RawHeight::Number(n) => *n,
            RawHeight::Text(s) => s.trim().replace(',', ".").parse().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

/// Per-port events, normalised and time-ordered.
#[derive(Clone, Debug, Default)]
pub struct PortTideSource {
    ports: BTreeMap<String, Vec<TideEvent>>,
}

impl PortTideSource {
    /// Normalise a document: parse times and heights, sort, infer kinds.
    pub fn from_document(document: PortTideDocument) -> Self {
        let mut ports = BTreeMap::new();
        let mut skipped = 0usize;

        for (key, entry) in document.ports {
            let mut events = Vec::with_capacity(entry.tides_7d.len());
            for raw in &entry.tides_7d {
                match (local_instant(raw.date_iso, &raw.time_local), raw.height_m.metres()) {
                    (Some(timestamp), Some(height)) => events.push(TideEvent {
                        station_key: key.clone(),
                        timestamp,
                        height,
                        // Placeholder until neighbours are known
                        kind: TideKind::Low,
                    }),
                    _ => {
                        warn!(
                            "Skipping {} event on {} at '{}': unreadable time or height",
                            key, raw.date_iso, raw.time_local
                        );
                        skipped += 1;
                    }
                }
            }
            events.sort_by_key(|e| e.timestamp);
            infer_kinds(&mut events);
            ports.insert(key, events);
        }

        info!(
            "Per-port tide document: {} ports, {} events skipped",
            ports.len(),
            skipped
        );
        PortTideSource { ports }
    }

    /// Number of ports loaded.
    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }
}

/// Label each event by comparing it with the following event (or, for the
/// last one, the preceding event): the higher of the pair is high water.
fn infer_kinds(events: &mut [TideEvent]) {
    let heights: Vec<f64> = events.iter().map(|e| e.height).collect();
    for (i, event) in events.iter_mut().enumerate() {
        let neighbour = heights
            .get(i + 1)
            .or_else(|| i.checked_sub(1).and_then(|j| heights.get(j)));
        event.kind = match neighbour {
            Some(&other) if event.height > other => TideKind::High,
            _ => TideKind::Low,
        };
    }
}

impl TideSource for PortTideSource {
    fn station_keys(&self) -> Vec<&str> {
        self.ports.keys().map(String::as_str).collect()
    }

    fn has_station(&self, key: &str) -> bool {
        self.ports.contains_key(key)
    }

    fn events_on(&self, key: &str, day: NaiveDate) -> Vec<TideEvent> {
        self.ports
            .get(key)
            .map(|events| {
                events
                    .iter()
                    .filter(|e| e.timestamp.date() == day)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{ "ports": {
        "Rio Grande-RS (Porto)": {
            "tides_7d": [
                { "date_iso": "2025-03-10", "time_local": "10:15", "height_m": "0,2" },
                { "date_iso": "2025-03-10", "time_local": "4:05", "height_m": 0.6 },
                { "date_iso": "2025-03-10", "time_local": "16:30", "height_m": "0.7" },
                { "date_iso": "2025-03-11", "time_local": "xx", "height_m": "0.1" },
                { "date_iso": "2025-03-11", "time_local": "5:00", "height_m": "n/d" },
                { "date_iso": "2025-03-11", "time_local": "4:50", "height_m": "0.1" }
            ],
            "weather_hourly": [ { "date_iso": "2025-03-10", "hour_local": "10:00", "value": "Sol" } ]
        }
    } }"#;

    fn source() -> PortTideSource {
        let document: PortTideDocument = serde_json::from_str(DOC).unwrap();
        PortTideSource::from_document(document)
    }

    #[test]
    fn normalises_times_and_heights() {
        let source = source();
        let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let events = source.events_on("Rio Grande-RS (Porto)", day);
        let heights: Vec<f64> = events.iter().map(|e| e.height).collect();
        assert_eq!(heights, vec![0.6, 0.2, 0.7]);
        assert_eq!(events[0].timestamp, day.and_hms_opt(4, 5, 0).unwrap());
    }

    #[test]
    fn skips_unreadable_events() {
        let source = source();
        let day = NaiveDate::from_ymd_opt(2025, 3, 11).unwrap();
        assert_eq!(source.events_on("Rio Grande-RS (Porto)", day).len(), 1);
    }

    #[test]
    fn infers_high_and_low_from_neighbours() {
        let source = source();
        let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let kinds: Vec<TideKind> = source
            .events_on("Rio Grande-RS (Porto)", day)
            .iter()
            .map(|e| e.kind)
            .collect();
        assert_eq!(kinds, vec![TideKind::High, TideKind::Low, TideKind::High]);

        // Last event overall (0.1 m on the 11th) is compared with the 0.7 m before it
        let next_day = NaiveDate::from_ymd_opt(2025, 3, 11).unwrap();
        let last = &source.events_on("Rio Grande-RS (Porto)", next_day)[0];
        assert_eq!(last.kind, TideKind::Low);
    }

    #[test]
    fn keys_keep_their_decoration() {
        let source = source();
        assert_eq!(source.station_keys(), vec!["Rio Grande-RS (Porto)"]);
        assert!(!source.has_station("Rio Grande-RS"));
        assert_eq!(source.len(), 1);
    }
}
