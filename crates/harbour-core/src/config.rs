//! Configuration loading and typed config structures for the Harbour coordinator.
//!
//! The canonical configuration lives in `harbour-config.yaml` in the working
//! directory. Every section and field has a default, so an empty file (or
//! no file at all) yields a runnable configuration.

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use harbour_types::WireFormat;
use serde::Deserialize;
use tracing::warn;

use crate::operator::MIN_TICK_INTERVAL_MS;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is not usable.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level coordinator configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HarbourConfig {
    /// Simulated calendar settings.
    #[serde(default)]
    pub clock: ClockConfig,

    /// Tick loop pacing and bounds.
    #[serde(default)]
    pub simulation: SimulationBoundsConfig,

    /// Visualization link server.
    #[serde(default)]
    pub link: LinkConfig,

    /// Inbound container manifest.
    #[serde(default)]
    pub manifest: ManifestConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl HarbourConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override file values:
    /// - `HARBOUR_LINK_HOST` overrides `link.host`
    /// - `HARBOUR_LINK_PORT` overrides `link.port`
    /// - `HARBOUR_MANIFEST` overrides `manifest.path`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in
    /// production).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("HARBOUR_LINK_HOST") {
            self.link.host = host;
        }
        if let Some(raw) = lookup("HARBOUR_LINK_PORT") {
            match raw.parse::<u16>() {
                Ok(port) => self.link.port = port,
                Err(e) => warn!(value = raw, error = %e, "Ignoring invalid HARBOUR_LINK_PORT"),
            }
        }
        if let Some(path) = lookup("HARBOUR_MANIFEST") {
            self.manifest.path = path;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.clock.time_multiplier == 0 {
            return Err(ConfigError::Invalid {
                reason: "clock.time_multiplier must be at least 1".to_owned(),
            });
        }
        if self.simulation.tick_interval_ms < MIN_TICK_INTERVAL_MS {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "simulation.tick_interval_ms must be at least {MIN_TICK_INTERVAL_MS}"
                ),
            });
        }
        if self.simulation.connection_poll_ms == 0 {
            return Err(ConfigError::Invalid {
                reason: "simulation.connection_poll_ms must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

/// Simulated calendar configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClockConfig {
    /// Simulated date and time the clock starts at.
    #[serde(default = "default_start_date")]
    pub start_date: NaiveDateTime,

    /// How many simulated milliseconds pass per wall-clock millisecond.
    #[serde(default = "default_time_multiplier")]
    pub time_multiplier: u32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            start_date: default_start_date(),
            time_multiplier: default_time_multiplier(),
        }
    }
}

/// Tick loop pacing and optional run bounds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationBoundsConfig {
    /// Wall-clock sleep between ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// How often to check for a client while waiting for a connection.
    #[serde(default = "default_connection_poll_ms")]
    pub connection_poll_ms: u64,

    /// Stop after this many ticks (0 = unlimited).
    #[serde(default)]
    pub max_ticks: u64,

    /// Stop after this many wall-clock seconds (0 = unlimited).
    #[serde(default)]
    pub max_real_time_seconds: u64,
}

impl Default for SimulationBoundsConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            connection_poll_ms: default_connection_poll_ms(),
            max_ticks: 0,
            max_real_time_seconds: 0,
        }
    }
}

/// Visualization link server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LinkConfig {
    /// Address to bind.
    #[serde(default = "default_link_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_link_port")]
    pub port: u16,

    /// Encoding of outbound messages.
    #[serde(default)]
    pub format: WireFormat,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            host: default_link_host(),
            port: default_link_port(),
            format: WireFormat::default(),
        }
    }
}

/// Inbound manifest configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ManifestConfig {
    /// Path to the JSON manifest.
    #[serde(default = "default_manifest_path")]
    pub path: String,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            path: default_manifest_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is unset (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON log lines instead of human-readable ones.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

fn default_start_date() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2004, 12, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

const fn default_time_multiplier() -> u32 {
    200
}

const fn default_tick_interval_ms() -> u64 {
    50
}

const fn default_connection_poll_ms() -> u64 {
    500
}

fn default_link_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_link_port() -> u16 {
    3000
}

fn default_manifest_path() -> String {
    "manifest.json".to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = HarbourConfig::default();
        assert_eq!(config.clock.time_multiplier, 200);
        assert_eq!(config.clock.start_date.to_string(), "2004-12-01 00:00:00");
        assert_eq!(config.simulation.tick_interval_ms, 50);
        assert_eq!(config.simulation.connection_poll_ms, 500);
        assert_eq!(config.link.format, WireFormat::Tagged);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
clock:
  start_date: "2005-01-15T08:00:00"
  time_multiplier: 600

simulation:
  tick_interval_ms: 20
  connection_poll_ms: 100
  max_ticks: 1000
  max_real_time_seconds: 60

link:
  host: "127.0.0.1"
  port: 9001
  format: json

manifest:
  path: "data/xml8.json"

logging:
  level: "debug"
  json: true
"#;

        let config = HarbourConfig::parse(yaml);
        assert!(config.is_ok());
        let config = config.ok().unwrap_or_default();

        assert_eq!(config.clock.start_date.to_string(), "2005-01-15 08:00:00");
        assert_eq!(config.clock.time_multiplier, 600);
        assert_eq!(config.simulation.max_ticks, 1000);
        assert_eq!(config.link.port, 9001);
        assert_eq!(config.link.format, WireFormat::Json);
        assert_eq!(config.manifest.path, "data/xml8.json");
        assert!(config.logging.json);
    }

    #[test]
    fn parse_minimal_yaml() {
        let config = HarbourConfig::parse("link:\n  port: 7000\n");
        assert!(config.is_ok());
        let config = config.ok().unwrap_or_default();

        assert_eq!(config.link.port, 7000);
        assert_eq!(config.link.host, "0.0.0.0");
        assert_eq!(config.clock.time_multiplier, 200);
    }

    #[test]
    fn parse_empty_yaml() {
        assert!(HarbourConfig::parse("").is_ok());
    }

    #[test]
    fn zero_multiplier_is_rejected() {
        let result = HarbourConfig::parse("clock:\n  time_multiplier: 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn tick_interval_below_floor_is_rejected() {
        for interval in [0, MIN_TICK_INTERVAL_MS.saturating_sub(1)] {
            let yaml = format!("simulation:\n  tick_interval_ms: {interval}\n");
            let result = HarbourConfig::parse(&yaml);
            assert!(matches!(result, Err(ConfigError::Invalid { .. })), "{interval}");
        }
        let yaml = format!("simulation:\n  tick_interval_ms: {MIN_TICK_INTERVAL_MS}\n");
        assert!(HarbourConfig::parse(&yaml).is_ok());
    }

    #[test]
    fn overrides_replace_values() {
        let mut env = BTreeMap::new();
        env.insert("HARBOUR_LINK_HOST", "10.0.0.5".to_owned());
        env.insert("HARBOUR_LINK_PORT", "4100".to_owned());
        env.insert("HARBOUR_MANIFEST", "other.json".to_owned());

        let mut config = HarbourConfig::default();
        config.apply_overrides(|key| env.get(key).cloned());

        assert_eq!(config.link.host, "10.0.0.5");
        assert_eq!(config.link.port, 4100);
        assert_eq!(config.manifest.path, "other.json");
    }

    #[test]
    fn invalid_port_override_is_ignored() {
        let mut config = HarbourConfig::default();
        config.apply_overrides(|key| (key == "HARBOUR_LINK_PORT").then(|| "not-a-port".to_owned()));
        assert_eq!(config.link.port, 3000);
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("harbour-config.yaml");
        if path.exists() {
            let config = HarbourConfig::from_file(&path);
            assert!(config.is_ok(), "project config should parse: {config:?}");
        }
    }
}
