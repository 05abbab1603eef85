//! Logging setup errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Reasons logging could not be configured or installed.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The `[logging]` format is not one of the supported names.
    #[error("unknown log format '{0}'; expected one of: pretty, compact, json, full")]
    UnknownFormat(String),

    /// The level or an extra directive does not parse as a filter.
    #[error("invalid log filter '{directive}': {message}")]
    InvalidFilter {
        /// Offending level or directive.
        directive: String,
        /// Parser message.
        message: String,
    },

    /// The rolling-file directory could not be created.
    #[error("failed to create log directory {}: {source}", path.display())]
    LogDirectory {
        /// Directory that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A global subscriber is already installed.
    #[error("logging already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
