#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Host side of the viewbridge webview bridge.
//!
//! A [`WebviewView`] owns one duplex channel and one UI surface. Requests
//! arriving from the surface go through a [`RequestRouter`]: the backend
//! namespace is proxied to the signed-in backend, everything else is looked
//! up in the local command table. A [`NotificationRouter`] forwards host
//! events to the surface and handles the surface's own notifications.
//!
//! Views share one [`BridgeContext`] (session, config store, event bus and
//! environment).
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use viewbridge_config::BridgeConfig;
//! use viewbridge_host::{BridgeContext, SystemUrlOpener};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let resolved = BridgeConfig::load(None)?;
//! let ctx = BridgeContext::with_agent(&resolved.config, Arc::new(SystemUrlOpener))?;
//! # let _ = ctx;
//! # Ok(())
//! # }
//! ```

pub mod prelude;

mod context;
mod environment;
mod error;
mod notification_router;
mod ready;
mod request_router;
mod routes;
mod surface;
mod view;
mod view_context;

#[cfg(test)]
mod testing;

pub use context::{BridgeContext, BridgeSettings};
pub use environment::{EditorContextSource, SystemUrlOpener, UrlOpener};
pub use error::{BridgeError, BridgeResult};
pub use notification_router::{NotificationRouter, to_webview};
pub use ready::ReadyLatch;
pub use request_router::RequestRouter;
pub use routes::{Command, Route, RouteTable};
pub use surface::{SurfaceFactory, UiSurface};
pub use view::{SerializedView, WebviewView};
pub use view_context::ViewContext;
