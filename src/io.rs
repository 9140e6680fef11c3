//! Snapshot ingestion.
//!
//! The logger writes one JSON document per snapshot:
//!
//! ```json
//! {"locations": {"<tracker id>": {"latitude": 53551100, "longitude": 9993700, "timestamp": 1700000000}}}
//! ```
//!
//! Coordinates are fixed-point micro-degrees. Anything else (remote APIs,
//! databases) plugs in through [`FixSource`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{MassError, Result};
use crate::TrackerFix;

/// Fixed-point scale of the logger's coordinates.
pub const MICRO_DEGREES: f64 = 1e6;

/// Anything that can produce one snapshot of fixes.
pub trait FixSource {
    fn load_fixes(&self) -> Result<Vec<TrackerFix>>;
}

#[derive(Deserialize)]
struct LocationsDocument {
    #[serde(default)]
    locations: Option<BTreeMap<String, RawLocation>>,
}

#[derive(Deserialize)]
struct RawLocation {
    latitude: Option<f64>,
    longitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    timestamp: Option<i64>,
}

/// Whole seconds from an integer, float or numeric string.
///
/// Fractional seconds are truncated. Anything unreadable becomes `None`
/// so a single odd entry does not reject the whole snapshot.
fn lenient_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let seconds = |t: f64| t.is_finite().then(|| t.trunc() as i64);
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(seconds)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(seconds))
        }
        _ => None,
    }))
}

/// Parse a snapshot document.
///
/// Entries missing a coordinate are skipped. A document without
/// `locations` is an empty snapshot. Fixes come out sorted by id.
pub fn parse_locations(json: &str) -> serde_json::Result<Vec<TrackerFix>> {
    let doc: LocationsDocument = serde_json::from_str(json)?;
    let fixes = doc
        .locations
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(id, loc)| {
            let (lat, lon) = (loc.latitude?, loc.longitude?);
            Some(TrackerFix {
                id,
                latitude: lat / MICRO_DEGREES,
                longitude: lon / MICRO_DEGREES,
                timestamp: loc.timestamp,
            })
        })
        .collect();
    Ok(fixes)
}

/// A snapshot file on disk.
#[derive(Debug, Clone)]
pub struct JsonLocationsFile {
    path: PathBuf,
}

impl JsonLocationsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FixSource for JsonLocationsFile {
    fn load_fixes(&self) -> Result<Vec<TrackerFix>> {
        let content = fs::read_to_string(&self.path).map_err(|source| MassError::Io {
            path: self.path.clone(),
            source,
        })?;
        parse_locations(&content).map_err(|source| MassError::Parse {
            path: self.path.clone(),
            source,
        })
    }
}

/// Concatenate snapshots and sort by `(id, timestamp)`.
///
/// Fixes without a timestamp sort after timestamped fixes of the same id.
/// The sort is stable, so equal keys keep their snapshot order.
pub fn merge_snapshots(snapshots: impl IntoIterator<Item = Vec<TrackerFix>>) -> Vec<TrackerFix> {
    let mut merged: Vec<TrackerFix> = snapshots.into_iter().flatten().collect();
    merged.sort_by(|a, b| {
        a.id.cmp(&b.id)
            .then_with(|| a.timestamp.is_none().cmp(&b.timestamp.is_none()))
            .then(a.timestamp.cmp(&b.timestamp))
    });
    merged
}

/// Load several snapshot files and merge them.
pub fn load_merged<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<TrackerFix>> {
    let snapshots = paths
        .iter()
        .map(|p| JsonLocationsFile::new(p.as_ref()).load_fixes())
        .collect::<Result<Vec<_>>>()?;
    Ok(merge_snapshots(snapshots))
}
