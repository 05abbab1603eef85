//! The session state machine.
//!
//! ```text
//!            login / login_via_signup_token
//! SignedOut ────────────────────────────────▶ SigningIn
//!     ▲                                           │
//!     │ failure                       success     │
//!     ├───────────────────────────────────────────┤
//!     │                                           ▼
//!     └──────── logout / backend did logout ── SignedIn
//! ```
//!
//! Guarded transitions: a login while `SignedIn` answers
//! [`LoginResult::AlreadySignedIn`], while `SigningIn` answers
//! [`LoginResult::LoginInProgress`]. A logout outside `SignedIn` is a no-op.
//! Every transition publishes [`HostEvent::SessionStatusChanged`].

use std::sync::{Arc, Mutex, PoisonError, Weak};

use serde_json::{Map, Value};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;
use viewbridge_config::ConfigStore;
use viewbridge_events::{EventBus, EventMetadata, HostEvent, LogoutReason, SessionStatus};

use crate::backend::{Authenticated, BackendConnection, BackendConnector};
use crate::bootstrap::{BootstrapData, EnvironmentInfo, SessionInfo};
use crate::error::{SessionError, SessionResult};
use crate::login::{LoginCredentials, LoginResult, LoginState};

/// Bridge version reported in bootstrap data.
const BRIDGE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Host environment accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    /// Web application base URL.
    pub web_app_url: Url,
}

enum SessionState {
    SignedOut,
    SigningIn,
    SignedIn {
        connection: Arc<dyn BackendConnection>,
        state: LoginState,
    },
}

impl SessionState {
    fn status(&self) -> SessionStatus {
        match self {
            Self::SignedOut => SessionStatus::SignedOut,
            Self::SigningIn => SessionStatus::SigningIn,
            Self::SignedIn { .. } => SessionStatus::SignedIn,
        }
    }
}

/// Owns authentication state and the authenticated backend connection.
///
/// Shared by every view through an `Arc`. The state lock is never held
/// across an await point.
pub struct SessionManager {
    state: Mutex<SessionState>,
    signup_token: Mutex<Option<String>>,
    connector: Arc<dyn BackendConnector>,
    config: Arc<ConfigStore>,
    bus: EventBus,
    environment: Environment,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("status", &self.status())
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Create a signed-out session.
    #[must_use]
    pub fn new(
        connector: Arc<dyn BackendConnector>,
        config: Arc<ConfigStore>,
        bus: EventBus,
        environment: Environment,
    ) -> Self {
        Self {
            state: Mutex::new(SessionState::SignedOut),
            signup_token: Mutex::new(None),
            connector,
            config,
            bus,
            environment,
        }
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.lock_state().status()
    }

    /// Host environment accessors.
    #[must_use]
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// The shared option store.
    #[must_use]
    pub fn config(&self) -> &Arc<ConfigStore> {
        &self.config
    }

    /// Sign in with email and password.
    pub async fn login(&self, email: &str, password: &str) -> LoginResult {
        self.authenticate(LoginCredentials::Password {
            email: email.to_owned(),
            password: password.to_owned(),
        })
        .await
    }

    /// Redeem a signup token minted by the external browser flow.
    pub async fn login_via_signup_token(&self, token: &str) -> LoginResult {
        self.authenticate(LoginCredentials::SignupToken(token.to_owned()))
            .await
    }

    async fn authenticate(&self, credentials: LoginCredentials) -> LoginResult {
        {
            let mut state = self.lock_state();
            match *state {
                SessionState::SignedIn { .. } => {
                    debug!(kind = credentials.kind(), "login refused: already signed in");
                    return LoginResult::AlreadySignedIn;
                },
                SessionState::SigningIn => {
                    debug!(kind = credentials.kind(), "login refused: login in progress");
                    return LoginResult::LoginInProgress;
                },
                SessionState::SignedOut => *state = SessionState::SigningIn,
            }
        }
        self.publish_transition(SessionStatus::SignedOut, SessionStatus::SigningIn, None);

        let mut guard = SigningInGuard {
            session: self,
            armed: true,
        };
        let kind = credentials.kind();
        let outcome = self.connector.connect(credentials).await;
        guard.disarm();

        match outcome {
            Ok(Authenticated { connection, state }) => {
                info!(kind, user_id = %state.user_id, "signed in");
                *self.lock_state() = SessionState::SignedIn { connection, state };
                *self.lock_token() = None;
                self.publish_transition(SessionStatus::SigningIn, SessionStatus::SignedIn, None);
                LoginResult::Success
            },
            Err(code) => {
                let code = if code.is_success() {
                    warn!("connector reported failure with SUCCESS code");
                    LoginResult::Unknown
                } else {
                    code
                };
                info!(kind, result = %code, "sign-in failed");
                *self.lock_state() = SessionState::SignedOut;
                self.publish_transition(SessionStatus::SigningIn, SessionStatus::SignedOut, None);
                code
            },
        }
    }

    /// Sign out.
    ///
    /// Returns `false` without publishing anything unless the session was
    /// signed in.
    pub async fn logout(&self, reason: LogoutReason) -> bool {
        let connection = {
            let mut state = self.lock_state();
            if !matches!(*state, SessionState::SignedIn { .. }) {
                debug!(status = %state.status(), ?reason, "logout ignored");
                return false;
            }
            match std::mem::replace(&mut *state, SessionState::SignedOut) {
                SessionState::SignedIn { connection, .. } => connection,
                SessionState::SignedOut | SessionState::SigningIn => return false,
            }
        };

        info!(?reason, "signed out");
        self.publish_transition(
            SessionStatus::SignedIn,
            SessionStatus::SignedOut,
            Some(reason),
        );
        connection.disconnect().await;
        true
    }

    /// The pending signup token, generated on first use.
    ///
    /// The same token is returned until a sign-in succeeds.
    #[must_use]
    pub fn signup_token(&self) -> String {
        self.lock_token()
            .get_or_insert_with(|| Uuid::new_v4().to_string())
            .clone()
    }

    /// URL of the external Slack sign-in flow for the pending signup token.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidUrl`] if the web app URL cannot be
    /// extended.
    pub fn slack_login_url(&self) -> SessionResult<Url> {
        let base = self.environment.web_app_url.as_str().trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}/service-auth/slack"))
            .map_err(|e| SessionError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("state", &self.signup_token());
        Ok(url)
    }

    /// The authenticated backend connection.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotSignedIn`] outside `SignedIn`.
    pub fn backend(&self) -> SessionResult<Arc<dyn BackendConnection>> {
        match &*self.lock_state() {
            SessionState::SignedIn { connection, .. } => Ok(Arc::clone(connection)),
            SessionState::SignedOut | SessionState::SigningIn => Err(SessionError::NotSignedIn),
        }
    }

    /// Assemble a fresh bootstrap snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotSignedIn`] outside `SignedIn`.
    pub fn bootstrap_data(&self) -> SessionResult<BootstrapData> {
        let state = match &*self.lock_state() {
            SessionState::SignedIn { state, .. } => state.clone(),
            SessionState::SignedOut | SessionState::SigningIn => {
                return Err(SessionError::NotSignedIn);
            },
        };

        Ok(BootstrapData {
            session: SessionInfo {
                user_id: state.user_id,
                team_id: state.team_id,
            },
            environment: EnvironmentInfo {
                web_app_url: self
                    .environment
                    .web_app_url
                    .as_str()
                    .trim_end_matches('/')
                    .to_owned(),
            },
            configs: self.config.webview_snapshot(),
            context: Map::new(),
            version: BRIDGE_VERSION.to_owned(),
            state: state.extra,
        })
    }

    /// [`bootstrap_data`](Self::bootstrap_data) as JSON.
    ///
    /// # Errors
    ///
    /// Same as [`bootstrap_data`](Self::bootstrap_data).
    pub fn bootstrap_value(&self) -> SessionResult<Value> {
        Ok(serde_json::to_value(self.bootstrap_data()?)?)
    }

    /// Start converting backend "did logout" events into forced logouts.
    ///
    /// The task holds only a weak reference and exits once the session or
    /// the bus is dropped.
    #[must_use]
    pub fn spawn_backend_watcher(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.bus.subscribe();
        let session: Weak<Self> = Arc::downgrade(self);

        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let HostEvent::BackendDidLogout { reason, .. } = &*event else {
                    continue;
                };
                let Some(session) = session.upgrade() else {
                    break;
                };
                warn!(?reason, "backend ended the session");
                session.logout(*reason).await;
            }
            debug!("backend watcher stopped");
        })
    }

    fn publish_transition(
        &self,
        previous: SessionStatus,
        status: SessionStatus,
        reason: Option<LogoutReason>,
    ) {
        self.bus.publish(HostEvent::SessionStatusChanged {
            metadata: EventMetadata::new("session"),
            previous,
            status,
            reason,
        });
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_token(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.signup_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Returns the session to `SignedOut` if a login future is dropped while
/// `SigningIn`.
struct SigningInGuard<'a> {
    session: &'a SessionManager,
    armed: bool,
}

impl SigningInGuard<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for SigningInGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.session.lock_state();
        if matches!(*state, SessionState::SigningIn) {
            *state = SessionState::SignedOut;
            drop(state);
            warn!("login abandoned mid-flight");
            self.session.publish_transition(
                SessionStatus::SigningIn,
                SessionStatus::SignedOut,
                None,
            );
        }
    }
}
