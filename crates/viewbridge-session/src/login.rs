//! Login result codes, credentials and the authenticated user state.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Outcome of a login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoginResult {
    /// Signed in.
    Success,
    /// Email or password rejected.
    InvalidCredentials,
    /// Signup token unknown or expired.
    TokenInvalid,
    /// The account's email is not confirmed yet.
    NotConfirmed,
    /// The account does not belong to the requested team.
    UserNotOnTeam,
    /// The backend refuses this client version.
    VersionUnsupported,
    /// A session is already signed in.
    AlreadySignedIn,
    /// Another login attempt is in flight.
    LoginInProgress,
    /// Any other failure, including unrecognized backend codes.
    #[serde(other)]
    Unknown,
}

impl LoginResult {
    /// Wire code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::TokenInvalid => "TOKEN_INVALID",
            Self::NotConfirmed => "NOT_CONFIRMED",
            Self::UserNotOnTeam => "USER_NOT_ON_TEAM",
            Self::VersionUnsupported => "VERSION_UNSUPPORTED",
            Self::Unknown => "UNKNOWN",
            Self::AlreadySignedIn => "ALREADY_SIGNED_IN",
            Self::LoginInProgress => "LOGIN_IN_PROGRESS",
        }
    }

    /// Whether this is [`LoginResult::Success`].
    #[must_use]
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

impl std::fmt::Display for LoginResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credentials handed to a [`BackendConnector`](crate::BackendConnector).
#[derive(Clone, PartialEq, Eq)]
pub enum LoginCredentials {
    /// Email and password.
    Password {
        /// Account email.
        email: String,
        /// Account password.
        password: String,
    },
    /// A token minted by the external browser sign-in flow.
    SignupToken(String),
}

impl LoginCredentials {
    /// Short label for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Password { .. } => "password",
            Self::SignupToken(_) => "signup_token",
        }
    }
}

impl std::fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Password { email, .. } => f
                .debug_struct("Password")
                .field("email", email)
                .field("password", &"***")
                .finish(),
            Self::SignupToken(_) => f.debug_tuple("SignupToken").field(&"***").finish(),
        }
    }
}

/// User state reported by the backend on sign-in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginState {
    /// Signed-in user.
    pub user_id: String,
    /// Current team, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    /// Everything else the backend sent, flattened into bootstrap data.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
