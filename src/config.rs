//! # Configuration Management
//!
//! Loads planner settings from `voyage-config.toml`. Every section is optional
//! and every missing value takes its default, so an empty or absent file is a
//! valid configuration.
//!
//! ```toml
//! [routing]
//! snap_threshold_nm = 30.0
//! endpoint_match_nm = 20.0
//!
//! [tide]
//! max_bracket_gap_hours = 8.0
//! curve_half_window_minutes = 180
//! curve_step_minutes = 15
//! station_radius_nm = 30.0
//! alias_file = "station_aliases.toml"   # optional, replaces the bundled table
//!
//! [vessel]
//! speed_knots = 10.0
//! fuel_rate_lph = 0.0
//! fuel_stock_l = 0.0
//! ```

use crate::route_graph::DEFAULT_SNAP_THRESHOLD_NM;
use crate::tide::interpolate::DEFAULT_MAX_BRACKET_GAP_HOURS;
use crate::tide::locator::DEFAULT_STATION_RADIUS_NM;
use crate::tide::{AliasTable, TideError, TideInterpolator, TideService, TideSource};
use crate::voyage::VesselProfile;
use chrono::Duration;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "voyage-config.toml";

const DEFAULT_CURVE_HALF_WINDOW_MINUTES: i64 = 180;
const DEFAULT_CURVE_STEP_MINUTES: i64 = 15;
/// Longest curve window or step accepted from a file: one week.
const MAX_CURVE_MINUTES: i64 = 7 * 24 * 60;

/// Application configuration loaded from voyage-config.toml
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Route stitching and port matching
    pub routing: RoutingConfig,
    /// Tide estimation
    pub tide: TideConfig,
    /// Vessel planning figures
    pub vessel: VesselProfile,
}

/// Distances used when snapping track points to ports.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// A track endpoint closer than this to a port is attached to it
    pub snap_threshold_nm: f64,
    /// Radius for guessing departure/arrival ports of an imported track
    pub endpoint_match_nm: f64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        RoutingConfig {
            snap_threshold_nm: DEFAULT_SNAP_THRESHOLD_NM,
            endpoint_match_nm: 20.0,
        }
    }
}

/// Tide estimation and curve sampling settings.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TideConfig {
    /// Brackets wider than this are not interpolated
    pub max_bracket_gap_hours: f64,
    /// Curve spans this many minutes either side of the query instant
    pub curve_half_window_minutes: i64,
    /// Minutes between curve samples
    pub curve_step_minutes: i64,
    /// Radius within which a reference station is used
    pub station_radius_nm: f64,
    /// Alias table replacing the bundled one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias_file: Option<PathBuf>,
}

impl Default for TideConfig {
    fn default() -> Self {
        TideConfig {
            max_bracket_gap_hours: DEFAULT_MAX_BRACKET_GAP_HOURS as f64,
            curve_half_window_minutes: DEFAULT_CURVE_HALF_WINDOW_MINUTES,
            curve_step_minutes: DEFAULT_CURVE_STEP_MINUTES,
            station_radius_nm: DEFAULT_STATION_RADIUS_NM,
            alias_file: None,
        }
    }
}

impl TideConfig {
    /// Interpolator using the configured bracket limit.
    ///
    /// A limit that is not a positive, representable duration falls back to
    /// the default with a warning.
    pub fn interpolator(&self) -> TideInterpolator {
        let hours = self.max_bracket_gap_hours;
        let max_gap = Some(hours)
            .filter(|h| h.is_finite() && *h > 0.0)
            .and_then(|h| Duration::try_milliseconds((h * 3_600_000.0).round() as i64))
            .unwrap_or_else(|| {
                warn!(
                    "max_bracket_gap_hours = {} unusable, using {}",
                    hours, DEFAULT_MAX_BRACKET_GAP_HOURS
                );
                Duration::hours(DEFAULT_MAX_BRACKET_GAP_HOURS)
            });
        TideInterpolator::new(max_gap)
    }

    /// Curve half window; negative or oversized values give the default.
    pub fn curve_half_window(&self) -> Duration {
        minutes_or_default(
            "curve_half_window_minutes",
            self.curve_half_window_minutes,
            0,
            DEFAULT_CURVE_HALF_WINDOW_MINUTES,
        )
    }

    /// Curve step; zero, negative or oversized values give the default.
    pub fn curve_step(&self) -> Duration {
        minutes_or_default(
            "curve_step_minutes",
            self.curve_step_minutes,
            1,
            DEFAULT_CURVE_STEP_MINUTES,
        )
    }

    /// The configured alias table, or the bundled one when none is named.
    pub fn aliases(&self) -> Result<AliasTable, TideError> {
        match &self.alias_file {
            Some(path) => {
                let table = AliasTable::load_from_path(path)?;
                info!(
                    "Loaded {} station aliases from {}",
                    table.len(),
                    path.display()
                );
                Ok(table)
            }
            None => Ok(AliasTable::builtin()),
        }
    }

    /// An empty tide service built from these settings.
    pub fn service<S: TideSource>(&self) -> Result<TideService<S>, TideError> {
        Ok(TideService::new(self.aliases()?, self.interpolator()))
    }
}

fn minutes_or_default(field: &str, minutes: i64, min: i64, default: i64) -> Duration {
    Some(minutes)
        .filter(|m| *m >= min && *m <= MAX_CURVE_MINUTES)
        .and_then(Duration::try_minutes)
        .unwrap_or_else(|| {
            warn!("{} = {} unusable, using {}", field, minutes, default);
            Duration::minutes(default)
        })
}

impl Config {
    /// Load configuration from voyage-config.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!("Loaded configuration from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Invalid config file {}: {}", path.display(), e);
                    warn!("Using default configuration");
                    Self::default()
                }
            },
            Err(_) => {
                info!("No config file at {}, using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Write the configuration as pretty TOML to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), contents)?;
        info!("Configuration saved to {}", path.as_ref().display());
        Ok(())
    }
}
