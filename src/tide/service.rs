//! Session-level access to the loaded tide table.
//!
//! [`TideService`] owns the current table snapshot and everything derived from
//! it for the session:
//! - **Load guard**: until a table is installed every query answers "no data"
//! - **Reloads**: each load carries a generation number; a result older than
//!   the installed one is discarded, so the last load to *start* wins even if
//!   an older one finishes later
//! - **Memoised resolution**: fuzzy station lookup runs once per query string
//!   and is forgotten whenever a new table is installed
//!
//! Queries take `&self` and never block; the table is a read-only snapshot.

use super::interpolate::TideInterpolator;
use super::resolve::{resolve_station_key, AliasTable};
use super::{TideQueryResult, TideSource, TideTable, Trend};
use crate::ports::PortRegistry;
use chrono::{Duration, NaiveDateTime};
use log::{debug, info, warn};
use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashMap;

/// Upper bound on the number of samples in one curve.
pub const MAX_CURVE_SAMPLES: i64 = 10_000;

/// One sample of a tide curve.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CurvePoint {
    /// Sample instant
    pub at: NaiveDateTime,
    /// Estimated height in metres
    pub height: f64,
    /// Trend at the sample
    pub trend: Option<Trend>,
    /// True for the sample at the requested centre instant
    pub is_center: bool,
}

#[derive(Debug)]
struct Snapshot<S> {
    generation: u64,
    source: S,
}

/// Tide queries against the most recently installed table.
#[derive(Debug)]
pub struct TideService<S = TideTable> {
    snapshot: Option<Snapshot<S>>,
    aliases: AliasTable,
    interpolator: TideInterpolator,
    resolved: RefCell<HashMap<String, Option<String>>>,
}

impl<S: TideSource> Default for TideService<S> {
    fn default() -> Self {
        TideService::new(AliasTable::builtin(), TideInterpolator::default())
    }
}

impl<S: TideSource> TideService<S> {
    /// An empty service; nothing is answerable until [`install`](Self::install).
    pub fn new(aliases: AliasTable, interpolator: TideInterpolator) -> Self {
        TideService {
            snapshot: None,
            aliases,
            interpolator,
            resolved: RefCell::new(HashMap::new()),
        }
    }

    /// Whether a table has been installed.
    pub fn is_loaded(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Generation of the installed table.
    pub fn generation(&self) -> Option<u64> {
        self.snapshot.as_ref().map(|s| s.generation)
    }

    /// The installed table.
    pub fn source(&self) -> Option<&S> {
        self.snapshot.as_ref().map(|s| &s.source)
    }

    /// Install the result of a load started as `generation`.
    ///
    /// Returns `false`, leaving the current table in place, when a table of the
    /// same or a newer generation is already installed.
    pub fn install(&mut self, generation: u64, source: S) -> bool {
        if let Some(current) = self.generation() {
            if generation <= current {
                info!(
                    "Discarding tide table generation {} (generation {} installed)",
                    generation, current
                );
                return false;
            }
        }
        self.snapshot = Some(Snapshot { generation, source });
        self.resolved.borrow_mut().clear();
        info!("Installed tide table generation {}", generation);
        true
    }

    /// Resolve a port name or port registry id to a station key.
    ///
    /// Results, including misses, are remembered until the next install.
    /// `ports` is expected to be the same registry for the whole session.
    pub fn resolve_station_key(&self, ports: &PortRegistry, query: &str) -> Option<String> {
        let snapshot = self.snapshot.as_ref()?;

        if let Some(hit) = self.resolved.borrow().get(query) {
            return hit.clone();
        }

        let key = resolve_station_key(&snapshot.source, ports, &self.aliases, query);
        self.resolved
            .borrow_mut()
            .insert(query.to_string(), key.clone());
        key
    }

    /// Height and trend at `at` for an exact station key.
    ///
    /// Unknown keys and an unloaded service both answer [`TideQueryResult::ABSENT`].
    pub fn height_and_trend_at(&self, station_key: &str, at: NaiveDateTime) -> TideQueryResult {
        let Some(snapshot) = self.snapshot.as_ref() else {
            return TideQueryResult::ABSENT;
        };
        if !snapshot.source.has_station(station_key) {
            debug!("No tide station '{}' in loaded table", station_key);
            return TideQueryResult::ABSENT;
        }
        self.interpolator
            .height_and_trend_at(&snapshot.source, station_key, at)
    }

    /// Resolve `query` and estimate at `at`; unresolved names answer absent.
    pub fn lookup(&self, ports: &PortRegistry, query: &str, at: NaiveDateTime) -> TideQueryResult {
        match self.resolve_station_key(ports, query) {
            Some(key) => self.height_and_trend_at(&key, at),
            None => TideQueryResult::ABSENT,
        }
    }

    /// Sample the estimate every `step` from `center - half_window` to
    /// `center + half_window`. Instants without data are left out.
    ///
    /// Windows of more than [`MAX_CURVE_SAMPLES`] samples give an empty curve.
    /// Samples that fall outside the representable date range are skipped.
    pub fn curve(
        &self,
        station_key: &str,
        center: NaiveDateTime,
        half_window: Duration,
        step: Duration,
    ) -> Vec<CurvePoint> {
        if step <= Duration::zero() || half_window < Duration::zero() {
            return Vec::new();
        }
        let samples = half_window.num_milliseconds() / step.num_milliseconds().max(1);
        if samples > MAX_CURVE_SAMPLES / 2 {
            warn!(
                "Curve of ±{} min every {} min is too long, not sampled",
                half_window.num_minutes(),
                step.num_minutes()
            );
            return Vec::new();
        }

        let mut points = Vec::new();
        let mut offset = -half_window;
        while offset <= half_window {
            if let Some(at) = center.checked_add_signed(offset) {
                let result = self.height_and_trend_at(station_key, at);
                if let Some(height) = result.height {
                    points.push(CurvePoint {
                        at,
                        height,
                        trend: result.trend,
                        is_center: offset == Duration::zero(),
                    });
                }
            }
            match offset.checked_add(&step) {
                Some(next) => offset = next,
                None => break,
            }
        }
        points
    }
}
