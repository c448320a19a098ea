//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during engine startup.

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
        source: durdle_core::config::ConfigError,
    },

    /// Tick scheduler construction failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: durdle_core::clock::ClockError,
    },

    /// An executor could not be built from its configuration.
    #[error("executor error: {source}")]
    Executor {
        /// The underlying executor error.
        #[from]
        source: durdle_core::executor::ExecutorError,
    },

    /// A snapshot could not be serialized for the final report.
    #[error("snapshot error: {source}")]
    Snapshot {
        /// The underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}
