//! Ingestion of the inbound container manifest.
//!
//! The manifest is a JSON array of container descriptors:
//!
//! ```json
//! [
//!   { "id": "MSKU0001", "arrival": "2004-12-01T06:30:00",
//!     "category": "zeeschip", "x": 0, "y": 2, "z": 1 }
//! ]
//! ```
//!
//! Every descriptor is validated on its own. Malformed entries are logged
//! and counted, never pooled; the rest of the manifest still loads.

use std::path::Path;

use chrono::NaiveDateTime;
use harbour_types::{Container, ContainerId, SpawnPoint, TransportCategory};
use serde::Deserialize;
use tracing::{info, warn};

/// Exclusive upper bound for every spawn coordinate, and so for the grid
/// extent of any transporter built from the manifest.
pub const MAX_GRID_EXTENT: u32 = 1024;

/// Accepted arrival formats, tried in order.
const ARRIVAL_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

/// Errors that make a whole manifest unreadable.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// The manifest file could not be read.
    #[error("failed to read manifest: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The manifest is not a JSON array of objects.
    #[error("failed to parse manifest JSON: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}

/// Reasons a single manifest entry is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntryError {
    /// The id is empty or whitespace.
    #[error("container id is empty")]
    EmptyId,

    /// The category names no known transport category.
    #[error("unknown transport category {0:?}")]
    UnknownCategory(String),

    /// A coordinate is negative.
    #[error("negative {axis} coordinate {value}")]
    NegativeCoordinate {
        /// Which axis.
        axis: char,
        /// The offending value.
        value: i64,
    },

    /// A coordinate is at or above [`MAX_GRID_EXTENT`].
    #[error("{axis} coordinate {value} out of range (limit {MAX_GRID_EXTENT})")]
    CoordinateOutOfRange {
        /// Which axis.
        axis: char,
        /// The offending value.
        value: i64,
    },

    /// The arrival could not be parsed.
    #[error("unparseable arrival {0:?}")]
    InvalidArrival(String),
}

/// A raw manifest descriptor, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ManifestEntry {
    /// Container id.
    pub id: String,
    /// Scheduled arrival, e.g. `2004-12-01T06:30:00`.
    pub arrival: String,
    /// Transport category name.
    pub category: String,
    /// Spawn row.
    pub x: i64,
    /// Spawn column.
    pub y: i64,
    /// Spawn stacking level.
    pub z: i64,
}

impl TryFrom<ManifestEntry> for Container {
    type Error = EntryError;

    fn try_from(entry: ManifestEntry) -> Result<Self, Self::Error> {
        let id = entry.id.trim();
        if id.is_empty() {
            return Err(EntryError::EmptyId);
        }
        let category: TransportCategory = entry
            .category
            .parse()
            .map_err(|_unknown| EntryError::UnknownCategory(entry.category.clone()))?;
        let arrival = parse_arrival(&entry.arrival)?;
        let spawn = SpawnPoint::new(
            coordinate('x', entry.x)?,
            coordinate('y', entry.y)?,
            coordinate('z', entry.z)?,
        );
        Ok(Self::new(ContainerId::new(id), arrival, category, spawn))
    }
}

/// Result of loading a manifest.
#[derive(Debug, Default)]
pub struct ManifestLoad {
    /// Entries that passed validation.
    pub containers: Vec<Container>,
    /// Rejected entries with their position in the manifest.
    pub rejected: Vec<(usize, EntryError)>,
}

/// Validate raw entries, keeping the good ones.
pub fn ingest(entries: Vec<ManifestEntry>) -> ManifestLoad {
    let mut load = ManifestLoad::default();
    for (index, entry) in entries.into_iter().enumerate() {
        let id = entry.id.clone();
        match Container::try_from(entry) {
            Ok(container) => load.containers.push(container),
            Err(e) => {
                warn!(index, container_id = id, error = %e, "Rejected manifest entry");
                load.rejected.push((index, e));
            }
        }
    }
    load
}

/// Parse a JSON manifest.
///
/// # Errors
///
/// Returns [`ManifestError::Json`] if the text is not an array of
/// descriptor objects.
pub fn parse_manifest(json: &str) -> Result<ManifestLoad, ManifestError> {
    let entries: Vec<ManifestEntry> = serde_json::from_str(json)?;
    Ok(ingest(entries))
}

/// Read and parse a JSON manifest file.
///
/// # Errors
///
/// Returns [`ManifestError`] if the file cannot be read or parsed.
pub fn load_manifest(path: &Path) -> Result<ManifestLoad, ManifestError> {
    let contents = std::fs::read_to_string(path)?;
    let load = parse_manifest(&contents)?;
    info!(
        path = %path.display(),
        accepted = load.containers.len(),
        rejected = load.rejected.len(),
        "Manifest loaded"
    );
    Ok(load)
}

fn parse_arrival(raw: &str) -> Result<NaiveDateTime, EntryError> {
    let trimmed = raw.trim();
    ARRIVAL_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| EntryError::InvalidArrival(raw.to_owned()))
}

fn coordinate(axis: char, value: i64) -> Result<u32, EntryError> {
    if value < 0 {
        return Err(EntryError::NegativeCoordinate { axis, value });
    }
    u32::try_from(value)
        .ok()
        .filter(|v| *v < MAX_GRID_EXTENT)
        .ok_or(EntryError::CoordinateOutOfRange { axis, value })
}
