//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup and the coordinator run.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: harbour_core::config::ConfigError,
    },

    /// The container manifest could not be loaded.
    #[error("manifest error: {source}")]
    Manifest {
        /// The underlying manifest error.
        #[from]
        source: harbour_core::manifest::ManifestError,
    },

    /// The link server failed to start.
    #[error("link error: {source}")]
    Link {
        /// The underlying startup error.
        #[from]
        source: harbour_link::StartupError,
    },

    /// The coordinator loop failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: harbour_core::runner::RunnerError,
    },
}
