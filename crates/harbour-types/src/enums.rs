//! Enumeration types for the Harbour coordinator.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// The kind of vehicle a container arrives on.
///
/// The declaration order is the order in which the distribution engine
/// processes categories: road, rail, inland waterway, sea.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum TransportCategory {
    /// Lorry.
    #[serde(alias = "vrachtauto")]
    Road,
    /// Freight train.
    #[serde(alias = "trein")]
    Rail,
    /// Inland barge.
    #[serde(alias = "binnenschip")]
    InlandWaterway,
    /// Sea-going vessel.
    #[serde(alias = "zeeschip")]
    Sea,
}

impl TransportCategory {
    /// All categories in processing order.
    pub const ALL: [Self; 4] = [Self::Road, Self::Rail, Self::InlandWaterway, Self::Sea];

    /// Canonical lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Road => "road",
            Self::Rail => "rail",
            Self::InlandWaterway => "inland_waterway",
            Self::Sea => "sea",
        }
    }

    /// Name understood by the legacy visualization client.
    pub const fn legacy_name(self) -> &'static str {
        match self {
            Self::Road => "vrachtauto",
            Self::Rail => "trein",
            Self::InlandWaterway => "binnenschip",
            Self::Sea => "zeeschip",
        }
    }

    /// Position of this category in [`Self::ALL`].
    pub const fn index(self) -> usize {
        match self {
            Self::Road => 0,
            Self::Rail => 1,
            Self::InlandWaterway => 2,
            Self::Sea => 3,
        }
    }
}

impl core::fmt::Display for TransportCategory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known [`TransportCategory`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown transport category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for TransportCategory {
    type Err = UnknownCategory;

    /// Accepts canonical names, their hyphenated forms, and legacy names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "road" | "vrachtauto" => Ok(Self::Road),
            "rail" | "trein" => Ok(Self::Rail),
            "inland_waterway" | "inland-waterway" | "binnenschip" => Ok(Self::InlandWaterway),
            "sea" | "zeeschip" => Ok(Self::Sea),
            _ => Err(UnknownCategory(s.to_owned())),
        }
    }
}
