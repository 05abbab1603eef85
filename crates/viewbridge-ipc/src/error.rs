//! IPC error types.

use thiserror::Error;

/// Errors raised on the webview side of a duplex channel.
#[derive(Debug, Error)]
pub enum IpcError {
    /// The host answered with an `error` field.
    #[error("{0}")]
    Remote(String),

    /// No response arrived within the request timeout.
    #[error("request '{method}' timed out after {timeout_ms}ms")]
    Timeout {
        /// Method of the abandoned request.
        method: String,
        /// Timeout that elapsed.
        timeout_ms: u64,
    },

    /// The peer endpoint is gone.
    #[error("channel closed")]
    ChannelClosed,

    /// Params could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for IPC operations.
pub type IpcResult<T> = Result<T, IpcError>;
