//! Config file discovery and layered loading.
//!
//! 1. Parse `defaults.toml` → base
//! 2. Merge `~/.viewbridge/config.toml` (user)
//! 3. Merge `{workspace}/.viewbridge/config.toml` (workspace)
//! 4. Apply env var fallbacks for fields no file set
//! 5. Deserialize merged tree → [`BridgeConfig`]
//! 6. Validate

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::env::{apply_env_fallbacks, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources, deep_merge_tracking, record_leaves};
use crate::types::BridgeConfig;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// Directory name holding config files under home and workspace roots.
const CONFIG_DIR: &str = ".viewbridge";

/// A loaded configuration together with where each field came from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The final configuration.
    pub config: BridgeConfig,
    /// Layer that set each dotted field path.
    pub field_sources: FieldSources,
    /// Config files that were found and merged, in merge order.
    pub loaded_files: Vec<String>,
}

/// Load the configuration with layered file precedence.
///
/// `workspace_root` is the root of the current project. If `None`, the
/// workspace layer is skipped. `home_override` is treated as the
/// `.viewbridge` directory itself and bypasses home discovery.
///
/// # Errors
///
/// Returns a [`ConfigError`] if any config file is malformed, or if the
/// final merged configuration fails validation.
pub fn load(
    workspace_root: Option<&Path>,
    home_override: Option<&Path>,
) -> ConfigResult<ResolvedConfig> {
    load_with_env(workspace_root, home_override, &collect_env_vars())
}

/// [`load`] with an explicit environment, for callers that must not read
/// the process environment.
///
/// # Errors
///
/// Same as [`load`].
pub fn load_with_env<S: ::std::hash::BuildHasher>(
    workspace_root: Option<&Path>,
    home_override: Option<&Path>,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<ResolvedConfig> {
    let mut merged = parse_defaults()?;
    let mut field_sources = FieldSources::new();
    let mut loaded_files = Vec::new();
    record_leaves(&merged, "", &ConfigLayer::Defaults, &mut field_sources);

    let user_path = match home_override {
        Some(dir) => dir.join("config.toml"),
        None => home_directory()?.join(CONFIG_DIR).join("config.toml"),
    };
    if let Some(overlay) = try_load_file(&user_path)? {
        deep_merge_tracking(
            &mut merged,
            &overlay,
            "",
            &ConfigLayer::User,
            &mut field_sources,
        );
        loaded_files.push(user_path.display().to_string());
        info!(path = %user_path.display(), "loaded user config");
    }

    if let Some(ws_root) = workspace_root {
        let ws_path = ws_root.join(CONFIG_DIR).join("config.toml");
        if let Some(overlay) = try_load_file(&ws_path)? {
            deep_merge_tracking(
                &mut merged,
                &overlay,
                "",
                &ConfigLayer::Workspace,
                &mut field_sources,
            );
            loaded_files.push(ws_path.display().to_string());
            info!(path = %ws_path.display(), "loaded workspace config");
        }
    }

    let env_count = apply_env_fallbacks(&mut merged, &mut field_sources, env_vars);
    if env_count > 0 {
        debug!(count = env_count, "applied environment variable fallbacks");
    }

    let config: BridgeConfig =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<merged config>".to_owned(),
                source: e,
            })?;

    validate::validate(&config)?;

    Ok(ResolvedConfig {
        config,
        field_sources,
        loaded_files,
    })
}

/// Load a config from a single file layered over the embedded defaults.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read, parsed, or fails
/// validation.
pub fn load_file(path: &Path) -> ConfigResult<BridgeConfig> {
    let overlay = try_load_file(path)?.ok_or_else(|| ConfigError::ReadError {
        path: path.display().to_string(),
        source: std::io::Error::from(std::io::ErrorKind::NotFound),
    })?;

    let mut merged = parse_defaults()?;
    let mut sources = FieldSources::new();
    deep_merge_tracking(&mut merged, &overlay, "", &ConfigLayer::User, &mut sources);

    let config: BridgeConfig =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: path.display().to_string(),
                source: e,
            })?;

    validate::validate(&config)?;
    Ok(config)
}

/// The embedded defaults as a configuration.
///
/// # Errors
///
/// Returns a [`ConfigError`] only if the embedded file is broken.
pub fn defaults() -> ConfigResult<BridgeConfig> {
    toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
        path: "<embedded defaults>".to_owned(),
        source: e,
    })
}

fn parse_defaults() -> ConfigResult<toml::Value> {
    toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
        path: "<embedded defaults>".to_owned(),
        source: e,
    })
}

/// Try to load a file, returning `None` if the file doesn't exist.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    if content.len() as u64 > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {MAX_CONFIG_FILE_SIZE} byte limit",
                content.len()
            ),
        });
    }

    let value: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(Some(value))
}

/// Determine the user's home directory.
fn home_directory() -> ConfigResult<PathBuf> {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .ok_or(ConfigError::NoHomeDir)
}
