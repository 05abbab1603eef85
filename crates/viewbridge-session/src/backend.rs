//! Backend collaborator traits.
//!
//! The session never talks to a transport directly. A [`BackendConnector`]
//! exchanges credentials for an authenticated [`BackendConnection`], which
//! the request router uses to proxy the reserved namespace.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::BackendError;
use crate::login::{LoginCredentials, LoginResult, LoginState};

/// An authenticated remote-call channel to the backend.
#[async_trait]
pub trait BackendConnection: Send + Sync {
    /// Send one request and wait for its result.
    async fn send_request(&self, method: &str, params: Option<Value>) -> Result<Value, BackendError>;

    /// Release the connection after the session signs out.
    async fn disconnect(&self) {}
}

/// A successful sign-in.
pub struct Authenticated {
    /// Connection bound to the signed-in user.
    pub connection: Arc<dyn BackendConnection>,
    /// User state reported by the backend.
    pub state: LoginState,
}

impl std::fmt::Debug for Authenticated {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticated")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Exchanges credentials for an authenticated connection.
#[async_trait]
pub trait BackendConnector: Send + Sync {
    /// Attempt a sign-in.
    ///
    /// Returns the non-success [`LoginResult`] on failure. Transport
    /// failures map to [`LoginResult::Unknown`].
    async fn connect(&self, credentials: LoginCredentials) -> Result<Authenticated, LoginResult>;
}
