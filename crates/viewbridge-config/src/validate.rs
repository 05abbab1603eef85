//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::options;
use crate::types::BridgeConfig;

/// Upper bound for `bridge.request_timeout_secs`.
const MAX_REQUEST_TIMEOUT_SECS: u64 = 600;

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &BridgeConfig) -> ConfigResult<()> {
    validate_environment(config)?;
    validate_bridge(config)?;
    validate_logging(config)?;
    validate_webview(config)?;
    Ok(())
}

fn validate_environment(config: &BridgeConfig) -> ConfigResult<()> {
    let raw = &config.environment.web_app_url;
    let parsed = url::Url::parse(raw).map_err(|e| ConfigError::ValidationError {
        field: "environment.web_app_url".to_owned(),
        message: format!("'{raw}' is not a valid URL: {e}"),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::ValidationError {
            field: "environment.web_app_url".to_owned(),
            message: format!("unsupported scheme '{}'; expected http or https", parsed.scheme()),
        });
    }
    Ok(())
}

fn validate_bridge(config: &BridgeConfig) -> ConfigResult<()> {
    let b = &config.bridge;

    if b.backend_namespace.is_empty() || b.backend_namespace.contains('/') {
        return Err(ConfigError::ValidationError {
            field: "bridge.backend_namespace".to_owned(),
            message: "namespace must be non-empty and must not contain '/'".to_owned(),
        });
    }

    if b.request_timeout_secs == 0 || b.request_timeout_secs > MAX_REQUEST_TIMEOUT_SECS {
        return Err(ConfigError::ValidationError {
            field: "bridge.request_timeout_secs".to_owned(),
            message: format!("must be between 1 and {MAX_REQUEST_TIMEOUT_SECS}"),
        });
    }

    if b.channel_capacity == 0 {
        return Err(ConfigError::ValidationError {
            field: "bridge.channel_capacity".to_owned(),
            message: "channel capacity must be at least 1".to_owned(),
        });
    }

    if b.deserializer.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "bridge.deserializer".to_owned(),
            message: "deserializer name must not be empty".to_owned(),
        });
    }
    Ok(())
}

fn validate_logging(config: &BridgeConfig) -> ConfigResult<()> {
    let l = &config.logging;

    if !matches!(
        l.level.to_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    ) {
        return Err(ConfigError::ValidationError {
            field: "logging.level".to_owned(),
            message: format!(
                "unknown level '{}'; expected one of: trace, debug, info, warn, error",
                l.level
            ),
        });
    }

    if !matches!(
        l.format.to_lowercase().as_str(),
        "pretty" | "compact" | "json" | "full"
    ) {
        return Err(ConfigError::ValidationError {
            field: "logging.format".to_owned(),
            message: format!(
                "unknown format '{}'; expected one of: pretty, compact, json, full",
                l.format
            ),
        });
    }
    Ok(())
}

fn validate_webview(config: &BridgeConfig) -> ConfigResult<()> {
    for (name, value) in &config.webview {
        let spec = options::lookup(name).map_err(|e| ConfigError::ValidationError {
            field: format!("webview.{name}"),
            message: e.to_string(),
        })?;
        spec.check(value).map_err(|e| ConfigError::ValidationError {
            field: format!("webview.{name}"),
            message: e.to_string(),
        })?;
    }
    Ok(())
}
