//! Common imports for the agent backend.
//!
//! ```rust
//! use viewbridge_agent::prelude::*;
//! ```

pub use crate::{
    AgentConnection, AgentConnector, AgentError, AgentLauncher, AgentResult, ProcessLauncher,
};
