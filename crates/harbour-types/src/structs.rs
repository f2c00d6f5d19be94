//! Core entity structs: containers and their coordinates.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::TransportCategory;
use crate::ids::ContainerId;

/// Three-dimensional spawn coordinate of a container on its transporter.
///
/// `x` and `y` select the grid cell, `z` is the stacking level the manifest
/// recorded for the container.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct SpawnPoint {
    /// Row on the transporter.
    pub x: u32,
    /// Column on the transporter.
    pub y: u32,
    /// Stacking level.
    pub z: u32,
}

impl SpawnPoint {
    /// Create a spawn coordinate.
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Project onto the transporter grid, dropping the stacking level.
    pub const fn grid_point(self) -> GridPoint {
        GridPoint {
            x: self.x,
            y: self.y,
        }
    }
}

impl core::fmt::Display for SpawnPoint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Two-dimensional cell address on a transporter grid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct GridPoint {
    /// Row.
    pub x: u32,
    /// Column.
    pub y: u32,
}

impl GridPoint {
    /// Create a grid cell address.
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl core::fmt::Display for GridPoint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A shipping container scheduled to arrive in the harbour.
///
/// Containers are immutable once created. Validation of raw manifest
/// input happens before construction, so every `Container` in the system
/// carries a known category and non-negative coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Container {
    id: ContainerId,
    arrival: NaiveDateTime,
    category: TransportCategory,
    spawn: SpawnPoint,
}

impl Container {
    /// Create a container.
    pub const fn new(
        id: ContainerId,
        arrival: NaiveDateTime,
        category: TransportCategory,
        spawn: SpawnPoint,
    ) -> Self {
        Self {
            id,
            arrival,
            category,
            spawn,
        }
    }

    /// Manifest identifier.
    pub const fn id(&self) -> &ContainerId {
        &self.id
    }

    /// Scheduled arrival in simulated time.
    pub const fn arrival(&self) -> NaiveDateTime {
        self.arrival
    }

    /// Vehicle category the container arrives on.
    pub const fn category(&self) -> TransportCategory {
        self.category
    }

    /// Spawn coordinate on the arriving vehicle.
    pub const fn spawn(&self) -> SpawnPoint {
        self.spawn
    }

    /// Whether the container is due at `now`: strictly scheduled before it.
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        self.arrival < now
    }
}
