//! # Tide Estimation
//!
//! Tide tables publish only discrete events: the instant and height of each
//! high and low water. This module turns such a table into a height and trend
//! for any instant, and turns the port name a user typed into the key the
//! table is filed under.
//!
//! ## Data Sources
//! Two table shapes exist in practice and both implement [`TideSource`]:
//! - [`FlatTideTable`]: flat records keyed by exact station name, one group
//!   per calendar day, each event labelled HIGH or LOW
//! - [`PortTideSource`]: a per-port document with decorated keys such as
//!   `"Rio Grande-RS (Porto)"` and a rolling multi-day event list without labels
//!
//! [`TideTable`] wraps either one so callers can hold "whatever was loaded".
//!
//! ## Estimation
//! See [`interpolate`]: events from the query day and its neighbours are pooled,
//! the bracketing pair is found, and the height is blended with a half cosine.
//!
//! ## Name Resolution
//! See [`resolve`]: port id → display name, exact key, alias table, then an
//! accent- and case-insensitive substring match.
//!
//! ## No Data
//! Absence is explicit everywhere: an unresolved station or an empty window
//! yields `None`, never a height of `0.0`, which is a valid reading.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

pub mod flat_table;
pub mod interpolate;
pub mod locator;
pub mod port_json;
pub mod resolve;
pub mod service;

pub use flat_table::{FlatTideRecord, FlatTideTable};
pub use interpolate::TideInterpolator;
pub use locator::{locate_station, ReferenceStation, StationLocation};
pub use port_json::{PortTideDocument, PortTideSource};
pub use resolve::AliasTable;
pub use service::{CurvePoint, TideService};

/// Errors raised while loading tide tables or alias data.
#[derive(Error, Debug)]
pub enum TideError {
    /// Table or alias file could not be read
    #[error("tide data IO: {0}")]
    Io(#[from] io::Error),

    /// JSON did not match either table shape
    #[error("tide JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Alias table is not valid TOML
    #[error("alias table: {0}")]
    Aliases(#[from] toml::de::Error),

    /// Alias table written for a newer format
    #[error("unsupported alias table version {0}")]
    AliasVersion(u32),

    /// JSON parsed but is neither a record array nor a `{"ports": ...}` document
    #[error("unrecognised tide table layout")]
    UnrecognisedLayout,
}

/// High or low water.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TideKind {
    #[serde(alias = "high", alias = "High")]
    High,
    #[serde(alias = "low", alias = "Low")]
    Low,
}

/// Direction the water is moving.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Trend {
    Rising,
    Falling,
    Stable,
}

/// A recorded high or low water at one station.
///
/// `kind` is a hint only: source tables do not reliably alternate HIGH/LOW,
/// so it labels the trend and is never used to pair events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TideEvent {
    /// Key of the station in its source table
    pub station_key: String,
    /// Local civil time of the event
    pub timestamp: NaiveDateTime,
    /// Height above chart datum in metres
    pub height: f64,
    /// High or low water
    pub kind: TideKind,
}

/// Height and trend at one instant; both `None` means "no data".
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct TideQueryResult {
    /// Estimated height in metres
    pub height: Option<f64>,
    /// Direction of the water, when known
    pub trend: Option<Trend>,
}

impl TideQueryResult {
    /// The "no data" result.
    pub const ABSENT: TideQueryResult = TideQueryResult {
        height: None,
        trend: None,
    };

    pub fn is_absent(&self) -> bool {
        self.height.is_none()
    }
}

/// Read-only access to a loaded tide table.
///
/// Implementations only answer "which stations exist" and "which events fall
/// on this day"; interpolation and name resolution are written once against
/// this trait.
pub trait TideSource {
    /// Every station key, in a stable order.
    fn station_keys(&self) -> Vec<&str>;

    /// Whether `key` names a station exactly.
    fn has_station(&self, key: &str) -> bool;

    /// Events of `key` whose timestamp falls on `day`, in any order.
    fn events_on(&self, key: &str, day: NaiveDate) -> Vec<TideEvent>;
}

/// Combine a table date with a clock time such as `"4:05"` or `"16:40:00"`.
///
/// Tables are hand-maintained, so single-digit hours are common.
pub(crate) fn local_instant(day: NaiveDate, clock: &str) -> Option<NaiveDateTime> {
    let mut fields = clock.trim().split(':').map(|f| f.trim().parse::<u32>());
    let hour = fields.next()?.ok()?;
    let minute = fields.next()?.ok()?;
    let second = match fields.next() {
        Some(field) => field.ok()?,
        None => 0,
    };
    if fields.next().is_some() {
        return None;
    }
    NaiveTime::from_hms_opt(hour, minute, second).map(|time| day.and_time(time))
}

/// Either table shape, as loaded.
#[derive(Clone, Debug)]
pub enum TideTable {
    Flat(FlatTideTable),
    PerPort(PortTideSource),
}

impl TideTable {
    /// Load either shape from JSON: a record array is a flat table, an object
    /// with a `ports` member is a per-port document.
    pub fn from_json_str(json: &str) -> Result<Self, TideError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        match value {
            serde_json::Value::Array(_) => {
                let records: Vec<FlatTideRecord> = serde_json::from_value(value)?;
                Ok(TideTable::Flat(FlatTideTable::from_records(records)))
            }
            serde_json::Value::Object(ref map) if map.contains_key("ports") => {
                let document: PortTideDocument = serde_json::from_value(value)?;
                Ok(TideTable::PerPort(PortTideSource::from_document(document)))
            }
            _ => Err(TideError::UnrecognisedLayout),
        }
    }

    fn inner(&self) -> &dyn TideSource {
        match self {
            TideTable::Flat(table) => table as &dyn TideSource,
            TideTable::PerPort(table) => table as &dyn TideSource,
        }
    }
}

impl TideSource for TideTable {
    fn station_keys(&self) -> Vec<&str> {
        self.inner().station_keys()
    }

    fn has_station(&self, key: &str) -> bool {
        self.inner().has_station(key)
    }

    fn events_on(&self, key: &str, day: NaiveDate) -> Vec<TideEvent> {
        self.inner().events_on(key, day)
    }
}
