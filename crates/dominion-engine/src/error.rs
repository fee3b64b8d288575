//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup, the sweep loop, and shutdown.

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
        source: dominion_core::ConfigError,
    },

    /// Snapshot file I/O failed.
    #[error("snapshot I/O error: {source}")]
    SnapshotIo {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Snapshot (de)serialization failed.
    #[error("snapshot serialization error: {source}")]
    SnapshotFormat {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// The snapshot was internally inconsistent.
    #[error("realm error: {source}")]
    Realm {
        /// The underlying realm error.
        #[from]
        source: dominion_core::RealmError,
    },
}
