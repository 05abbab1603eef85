#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Host ↔ webview message transport.
//!
//! - [`DuplexChannel`] connects two in-process endpoints.
//! - [`classify`] turns raw JSON into a typed [`Envelope`], dropping
//!   anything malformed.
//! - [`WebviewClient`] is the UI-side helper that issues requests and
//!   collects notifications.
//! - [`protocol`] names every method that crosses the channel.

pub mod prelude;

mod channel;
mod client;
mod envelope;
mod error;
pub mod protocol;

pub use channel::{DuplexChannel, Endpoint, EndpointReceiver, EndpointSender};
pub use client::WebviewClient;
pub use envelope::{Envelope, Notification, Request, Response, ResponseBody, classify};
pub use error::{IpcError, IpcResult};
