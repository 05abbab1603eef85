//! Agent transport error types.

use std::io;

use thiserror::Error;
use viewbridge_session::BackendError;

/// Errors raised while talking to the agent process.
#[derive(Debug, Error)]
pub enum AgentError {
    /// No agent executable is configured.
    #[error("no agent executable configured")]
    NotConfigured,

    /// The agent process could not be started.
    #[error("failed to spawn agent '{program}': {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Reading or writing the agent's stdio failed.
    #[error("agent I/O error: {0}")]
    Io(#[from] io::Error),

    /// The agent violated the wire protocol.
    #[error("agent protocol error: {0}")]
    Protocol(String),

    /// A complete frame carried a body that is not JSON. The stream is
    /// still aligned on the next frame.
    #[error("malformed agent message: {0}")]
    MalformedMessage(#[source] serde_json::Error),

    /// The agent answered with a JSON-RPC error.
    #[error("{message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// Error message from the agent.
        message: String,
    },

    /// The agent connection is closed.
    #[error("agent connection closed")]
    Closed,

    /// A message could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;

impl From<AgentError> for BackendError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Rpc { message, .. } => Self::Remote(message),
            AgentError::Closed => Self::Disconnected,
            other => Self::Transport(other.to_string()),
        }
    }
}
