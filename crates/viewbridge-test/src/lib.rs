//! Shared test utilities for the viewbridge workspace.
//!
//! Mock collaborators for the host ([`MockBackend`], [`MockConnector`],
//! [`MockUrlOpener`], [`CapturingSurfaceFactory`], [`MockEditorSource`]),
//! fixtures, and a [`BridgeHarness`] that wires them into a working
//! [`BridgeContext`](viewbridge_host::BridgeContext).
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! viewbridge-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use viewbridge_test::BridgeHarness;
//!
//! #[tokio::test]
//! async fn bootstrap_after_login() {
//!     let harness = BridgeHarness::new();
//!     let (_view, client) = harness.open_view();
//!     client.request("login", Some(harness.valid_login())).await.unwrap();
//!     client.request("bootstrap", None).await.unwrap();
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod harness;
pub mod mocks;

pub use fixtures::*;
pub use harness::*;
pub use mocks::*;
