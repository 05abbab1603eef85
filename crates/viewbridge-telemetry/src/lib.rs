//! Viewbridge Telemetry - Logging and request tracing for the webview bridge.
//!
//! This crate provides:
//! - Configurable logging setup with multiple formats and targets
//! - [`RequestContext`], the per-request span wrapped around every routed
//!   webview request
//!
//! # Example
//!
//! ```rust,no_run
//! use viewbridge_telemetry::{LogConfig, LogFormat, RequestContext, setup_logging};
//!
//! # fn main() -> Result<(), viewbridge_telemetry::TelemetryError> {
//! let config = LogConfig::new("debug")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("viewbridge_agent=trace");
//! setup_logging(&config)?;
//!
//! let ctx = RequestContext::new("request_router").with_method("bootstrap");
//! let _guard = ctx.span().entered();
//! tracing::info!("Routing request");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod context;
mod error;
mod logging;

pub use context::{RequestContext, RequestGuard};
pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    FileLogConfig, FileRotation, LogConfig, LogFormat, LogTarget, setup_default_logging,
    setup_logging,
};
