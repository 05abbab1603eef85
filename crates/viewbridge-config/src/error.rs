//! Configuration error types.

use std::io;
use thiserror::Error;

/// Configuration error type.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// Path to the config file that could not be read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Failed to parse TOML configuration.
    #[error("Failed to parse config file at {path}: {source}")]
    ParseError {
        /// Path to the config file that failed to parse.
        path: String,
        /// Underlying TOML parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Configuration validation failed.
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// Field that failed validation.
        field: String,
        /// Validation failure description.
        message: String,
    },

    /// A webview option name outside the recognized set.
    #[error("unknown configuration option '{0}'")]
    UnknownOption(String),

    /// A webview option value of the wrong type.
    #[error("invalid value for configuration option '{name}': expected {expected}")]
    InvalidValue {
        /// Option name.
        name: String,
        /// Expected value kind.
        expected: &'static str,
    },

    /// Could not determine home directory.
    #[error("Could not determine home directory")]
    NoHomeDir,
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_option_display() {
        let err = ConfigError::UnknownOption("fontSize".to_string());
        assert_eq!(err.to_string(), "unknown configuration option 'fontSize'");
    }

    #[test]
    fn test_invalid_value_display() {
        let err = ConfigError::InvalidValue {
            name: "muteAll".to_string(),
            expected: "boolean",
        };
        assert_eq!(
            err.to_string(),
            "invalid value for configuration option 'muteAll': expected boolean"
        );
    }
}
