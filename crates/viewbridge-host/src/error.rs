//! Bridge error types.
//!
//! The `Display` string of a [`BridgeError`] is what a webview sees in the
//! `error` field of a response.

use thiserror::Error;
use viewbridge_agent::AgentError;
use viewbridge_config::ConfigError;
use viewbridge_session::{BackendError, LoginResult, SessionError};

/// Errors raised while serving a view.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Session operation failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A proxied backend call failed.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The agent backend could not be set up.
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// A sign-in attempt ended with a non-success code.
    #[error("{0}")]
    Login(LoginResult),

    /// No application accepted an external URL.
    #[error("No app found to open url")]
    UrlNotOpened,

    /// Request params did not have the expected shape.
    #[error("invalid params for '{method}': {message}")]
    InvalidParams {
        /// Method being handled.
        method: String,
        /// What was wrong.
        message: String,
    },

    /// The UI surface could not be created.
    #[error("surface error: {0}")]
    Surface(String),

    /// A value could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
