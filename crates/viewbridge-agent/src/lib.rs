#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Agent backend for the viewbridge host.
//!
//! The agent is a child process spoken to with JSON-RPC 2.0 over stdio,
//! each message framed by a `Content-Length` header.
//!
//! - [`AgentConnection`] implements
//!   [`BackendConnection`](viewbridge_session::BackendConnection) and
//!   republishes agent notifications onto the host event bus.
//! - [`AgentConnector`] implements
//!   [`BackendConnector`](viewbridge_session::BackendConnector) with the
//!   agent's `codestream/login` request.

pub mod prelude;

mod connection;
mod connector;
mod error;
pub mod framing;
pub mod protocol;

pub use connection::{AgentConnection, map_notification};
pub use connector::{AgentConnector, AgentLauncher, ProcessLauncher};
pub use error::{AgentError, AgentResult};
