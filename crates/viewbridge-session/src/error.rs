//! Session error types.

use thiserror::Error;

/// Failure reported by a backend connection.
///
/// `Display` is the backend's own message, so proxied failures reach the
/// webview verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The backend answered the request with an error.
    #[error("{0}")]
    Remote(String),

    /// The connection to the backend is gone.
    #[error("backend connection closed")]
    Disconnected,

    /// The request could not be sent.
    #[error("backend transport error: {0}")]
    Transport(String),
}

/// Errors raised by [`SessionManager`](crate::SessionManager) operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The operation needs an authenticated session.
    #[error("Not signed in")]
    NotSignedIn,

    /// A backend call failed.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// A URL could not be built from the environment.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Session state could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_signed_in_display() {
        assert_eq!(SessionError::NotSignedIn.to_string(), "Not signed in");
    }

    #[test]
    fn test_backend_error_is_transparent() {
        let err: SessionError = BackendError::Remote("stream not found".to_string()).into();
        assert_eq!(err.to_string(), "stream not found");
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SessionError>();
        assert_send_sync::<BackendError>();
    }
}
