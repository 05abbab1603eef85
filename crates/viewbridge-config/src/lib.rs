#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Configuration for the viewbridge host.
//!
//! Two halves live here:
//!
//! - [`BridgeConfig`], loaded once at startup from layered TOML files.
//! - [`ConfigStore`], the runtime option store that webviews write through
//!   `update-configuration` and that publishes a change event per write.
//!
//! # Configuration Precedence
//!
//! From highest to lowest priority:
//!
//! 1. **Workspace** (`{workspace}/.viewbridge/config.toml`)
//! 2. **User** (`~/.viewbridge/config.toml`)
//! 3. **Environment variables** (`VIEWBRIDGE_*`), fallback only
//! 4. **Embedded defaults** (`defaults.toml` compiled into the binary)

/// Environment variable fallback resolution.
pub mod env;
/// Configuration error types.
pub mod error;
/// Configuration file discovery and loading.
pub mod loader;
/// Layered configuration merging with source tracking.
pub mod merge;
/// The recognized webview option set.
pub mod options;
/// Runtime option store.
pub mod store;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub mod prelude;

pub use error::{ConfigError, ConfigResult};
pub use loader::ResolvedConfig;
pub use options::{OptionEffect, OptionKind, OptionSpec, RECOGNIZED_OPTIONS};
pub use store::ConfigStore;
pub use types::*;

impl BridgeConfig {
    /// Load configuration with the full precedence chain.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any config file is malformed or the final
    /// configuration fails validation.
    pub fn load(workspace_root: Option<&std::path::Path>) -> ConfigResult<ResolvedConfig> {
        loader::load(workspace_root, None)
    }

    /// Load configuration with an explicit `.viewbridge` home directory.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any config file is malformed or the final
    /// configuration fails validation.
    pub fn load_with_home(
        workspace_root: Option<&std::path::Path>,
        home_dir: &std::path::Path,
    ) -> ConfigResult<ResolvedConfig> {
        loader::load(workspace_root, Some(home_dir))
    }

    /// Load configuration from a single file over the embedded defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, parsed, or fails
    /// validation.
    pub fn load_file(path: &std::path::Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }

    /// The web application base URL, parsed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if the URL does not parse.
    pub fn web_app_url(&self) -> ConfigResult<url::Url> {
        url::Url::parse(&self.environment.web_app_url).map_err(|e| {
            ConfigError::ValidationError {
                field: "environment.web_app_url".to_owned(),
                message: e.to_string(),
            }
        })
    }
}
