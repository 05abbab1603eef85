//! Sign-in against an agent process.
//!
//! Each login launches a fresh agent and sends `codestream/login`. The
//! agent answers `{ result, state? }`; a non-success result shuts the agent
//! down again.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};
use viewbridge_config::AgentSection;
use viewbridge_events::EventBus;
use viewbridge_session::{
    Authenticated, BackendConnector, LoginCredentials, LoginResult, LoginState,
};

use crate::connection::AgentConnection;
use crate::error::{AgentError, AgentResult};
use crate::protocol;

/// Starts agent connections.
pub trait AgentLauncher: Send + Sync {
    /// Start one agent whose notifications publish onto `bus`.
    ///
    /// # Errors
    ///
    /// Returns an error if the agent cannot be started.
    fn launch(&self, bus: &EventBus) -> AgentResult<Arc<AgentConnection>>;
}

/// Launches the agent as a child process.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    program: String,
    args: Vec<String>,
}

impl ProcessLauncher {
    /// Launch `program` with `args`.
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build from the `[agent]` config section.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::NotConfigured`] when no path is set.
    pub fn from_config(section: &AgentSection) -> AgentResult<Self> {
        let path = section.path.as_ref().ok_or(AgentError::NotConfigured)?;
        Ok(Self::new(path.to_string_lossy(), section.args.clone()))
    }
}

impl AgentLauncher for ProcessLauncher {
    fn launch(&self, bus: &EventBus) -> AgentResult<Arc<AgentConnection>> {
        AgentConnection::spawn(&self.program, &self.args, bus.clone())
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    result: LoginResult,
    #[serde(default)]
    state: Option<LoginState>,
}

/// [`BackendConnector`] backed by an agent.
pub struct AgentConnector {
    launcher: Arc<dyn AgentLauncher>,
    bus: EventBus,
}

impl AgentConnector {
    /// Create a connector.
    #[must_use]
    pub fn new(launcher: Arc<dyn AgentLauncher>, bus: EventBus) -> Self {
        Self { launcher, bus }
    }
}

fn login_params(credentials: &LoginCredentials) -> Value {
    match credentials {
        LoginCredentials::Password { email, password } => {
            json!({ "email": email, "password": password })
        },
        LoginCredentials::SignupToken(token) => json!({ "signupToken": token }),
    }
}

#[async_trait]
impl BackendConnector for AgentConnector {
    async fn connect(&self, credentials: LoginCredentials) -> Result<Authenticated, LoginResult> {
        let connection = self.launcher.launch(&self.bus).map_err(|e| {
            warn!(error = %e, "could not start agent");
            LoginResult::Unknown
        })?;

        let reply = connection
            .request(protocol::LOGIN, Some(login_params(&credentials)))
            .await
            .and_then(|v| serde_json::from_value::<LoginResponse>(v).map_err(AgentError::from));

        let response = match reply {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, kind = credentials.kind(), "agent login failed");
                connection.shutdown().await;
                return Err(LoginResult::Unknown);
            },
        };

        match (response.result, response.state) {
            (LoginResult::Success, Some(state)) => {
                info!(user_id = %state.user_id, "agent authenticated");
                Ok(Authenticated { connection, state })
            },
            (LoginResult::Success, None) => {
                warn!("agent reported success without user state");
                connection.shutdown().await;
                Err(LoginResult::Unknown)
            },
            (code, _) => {
                connection.shutdown().await;
                Err(code)
            },
        }
    }
}
