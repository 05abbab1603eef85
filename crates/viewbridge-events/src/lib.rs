//! Viewbridge Events - Host-side event bus for the webview bridge.
//!
//! This crate provides:
//! - [`HostEvent`], the events raised by host-side sources (the backend
//!   connection, the session state machine and the configuration store)
//! - A broadcast-based [`EventBus`] that fans those events out to every open
//!   webview view
//!
//! # Architecture
//!
//! Every host-side source publishes onto one shared `EventBus`. Each webview
//! view subscribes once when it is wired and drops its receiver when it is
//! destroyed, so a destroyed view never observes another event.
//!
//! # Example
//!
//! ```rust
//! use viewbridge_events::{EventBus, EventMetadata, HostEvent};
//!
//! # async fn example() {
//! let bus = EventBus::new();
//! let mut receiver = bus.subscribe();
//!
//! bus.publish(HostEvent::BackendDataChanged {
//!     metadata: EventMetadata::new("agent"),
//!     payload: serde_json::json!({"type": "posts"}),
//! });
//!
//! let event = receiver.recv().await.unwrap();
//! assert_eq!(event.event_type(), "backend_data_changed");
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod bus;
mod event;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, Delivery, EventBus, EventReceiver};
pub use event::{EventMetadata, HostEvent, LogoutReason, SessionStatus};
