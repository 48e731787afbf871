//! Resolve a port name (or port registry id) to a tide-table station key.
//!
//! The lookup chain, first hit wins:
//! 1. A port registry id is replaced by that port's display name
//! 2. Exact key in the loaded table
//! 3. Alias table: other spellings of the port's own station
//! 4. Case-insensitive, accent-stripped substring match in either direction
//!    against every key, in the table's key order
//! 5. Proxy table: a neighbouring station for ports without one of their own
//!
//! Proxies come last so a table that does carry the port's own station is
//! always preferred over a neighbour's.
//!
//! When nothing matches the station is unresolved (`None`); callers must then
//! report "no data" rather than any default height.
//!
//! The alias table is versioned data (`data/station_aliases.toml`), bundled at
//! build time and replaceable at run time from a file.

use super::{TideError, TideSource};
use crate::ports::PortRegistry;
use log::{debug, warn};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Alias data shipped with the crate.
const BUILTIN_ALIASES: &str = include_str!("../../data/station_aliases.toml");

/// Newest alias file layout this build understands.
///
/// Version 1 files carry `[aliases]` only; version 2 adds `[proxies]`.
pub const ALIAS_FORMAT_VERSION: u32 = 2;

#[derive(Deserialize)]
struct AliasFile {
    version: u32,
    #[serde(default)]
    aliases: BTreeMap<String, Candidates>,
    #[serde(default)]
    proxies: BTreeMap<String, Candidates>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Candidates {
    One(String),
    Many(Vec<String>),
}

impl Candidates {
    fn into_vec(self) -> Vec<String> {
        match self {
            Candidates::One(key) => vec![key],
            Candidates::Many(keys) => keys,
        }
    }
}

fn flatten(entries: BTreeMap<String, Candidates>) -> BTreeMap<String, Vec<String>> {
    entries
        .into_iter()
        .map(|(name, candidates)| (name, candidates.into_vec()))
        .collect()
}

/// Registry name → candidate table keys, in order of preference.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AliasTable {
    version: u32,
    entries: BTreeMap<String, Vec<String>>,
    proxies: BTreeMap<String, Vec<String>>,
}

impl AliasTable {
    /// Parse an alias file.
    pub fn from_toml_str(text: &str) -> Result<Self, TideError> {
        let file: AliasFile = toml::from_str(text)?;
        if file.version > ALIAS_FORMAT_VERSION {
            return Err(TideError::AliasVersion(file.version));
        }
        Ok(AliasTable {
            version: file.version,
            entries: flatten(file.aliases),
            proxies: flatten(file.proxies),
        })
    }

    /// Read and parse an alias file from disk.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, TideError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// The bundled table. Falls back to an empty table if the bundled data is
    /// unreadable, which only a bad edit to the data file can cause.
    pub fn builtin() -> Self {
        Self::from_toml_str(BUILTIN_ALIASES).unwrap_or_else(|e| {
            warn!("Bundled station aliases unusable ({}), continuing without", e);
            Self::default()
        })
    }

    /// Format version the table was written in.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Other spellings of the station of `name`, possibly empty.
    pub fn candidates(&self, name: &str) -> &[String] {
        self.entries.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Neighbouring stations standing in for `name`, possibly empty.
    pub fn proxy_candidates(&self, name: &str) -> &[String] {
        self.proxies.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of names with aliases or proxies.
    pub fn len(&self) -> usize {
        self.entries
            .keys()
            .chain(self.proxies.keys().filter(|k| !self.entries.contains_key(*k)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.proxies.is_empty()
    }
}

/// Lowercase and strip diacritics, so "São Francisco" matches "sao francisco"
/// whether the accent is precomposed or a separate combining mark.
pub fn fold_name(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect::<String>()
        .trim()
        .to_string()
}

/// Run the lookup chain for `query` against `source`.
pub fn resolve_station_key(
    source: &dyn TideSource,
    ports: &PortRegistry,
    aliases: &AliasTable,
    query: &str,
) -> Option<String> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }

    let name = ports.get(query).map(|p| p.name.as_str()).unwrap_or(query);

    if source.has_station(name) {
        return Some(name.to_string());
    }

    if let Some(key) = aliases
        .candidates(name)
        .iter()
        .find(|key| source.has_station(key))
    {
        debug!("Station '{}' resolved by alias to '{}'", name, key);
        return Some(key.clone());
    }

    let needle = fold_name(name);
    if !needle.is_empty() {
        let found = source.station_keys().into_iter().find(|key| {
            let folded = fold_name(key);
            !folded.is_empty() && (folded.contains(&needle) || needle.contains(&folded))
        });
        if let Some(key) = found {
            debug!("Station '{}' resolved by name match to '{}'", name, key);
            return Some(key.to_string());
        }
    }

    if let Some(key) = aliases
        .proxy_candidates(name)
        .iter()
        .find(|key| source.has_station(key))
    {
        warn!("No tide station for '{}', using neighbouring station '{}'", name, key);
        return Some(key.clone());
    }

    warn!("No tide station found for '{}' (searched as '{}')", name, needle);
    None
}
