//! Common imports for session consumers.
//!
//! ```rust
//! use viewbridge_session::prelude::*;
//! ```

pub use crate::{
    BackendConnection, BackendConnector, BackendError, BootstrapData, Environment,
    LoginCredentials, LoginResult, LoginState, SessionError, SessionManager, SessionResult,
};
