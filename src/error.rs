//! Error types for telemetry collection and inference coordination.
//!
//! Nothing in this crate propagates an error across the public sampling
//! boundary (`get_stats`, `get_history`, `submit_frame`,
//! `get_current_response`, `cleanup`); these variants surface in logs and in
//! backend-internal paths, where the collector converts them into degraded
//! snapshot values.

use thiserror::Error;

/// Error type for telemetry and inference operations.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A stats backend is not available on this system.
    #[error("backend '{0}' is not available on this system")]
    BackendUnavailable(&'static str),

    /// A stats backend query failed after successful initialization.
    #[error("backend '{backend}' query failed: {message}")]
    QueryFailed {
        /// The backend that failed.
        backend: &'static str,
        /// Error message describing the failure.
        message: String,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {0}")]
    ConfigNotFound(String),

    /// Configuration parsing error with line number.
    #[error("configuration error at line {line}: {message}")]
    ConfigParse {
        /// Line number where the error occurred (1-indexed).
        line: usize,
        /// Error message describing the issue.
        message: String,
    },

    /// Invalid configuration value.
    #[error("invalid configuration value for '{key}': {message}")]
    ConfigInvalid {
        /// The configuration key with the invalid value.
        key: &'static str,
        /// Why the value is invalid.
        message: String,
    },

    /// An inference backend call failed.
    #[error("inference call failed: {0}")]
    Inference(String),
}

/// Result type alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;
