#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Session state machine for the viewbridge host.
//!
//! [`SessionManager`] owns the `SignedOut` / `SigningIn` / `SignedIn` state,
//! the authenticated [`BackendConnection`], the pending signup token and
//! bootstrap assembly. Backends plug in through [`BackendConnector`].

pub mod prelude;

mod backend;
mod bootstrap;
mod error;
mod login;
mod manager;

pub use backend::{Authenticated, BackendConnection, BackendConnector};
pub use bootstrap::{BootstrapData, EnvironmentInfo, SessionInfo};
pub use error::{BackendError, SessionError, SessionResult};
pub use login::{LoginCredentials, LoginResult, LoginState};
pub use manager::{Environment, SessionManager};
