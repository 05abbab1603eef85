//! Prelude module - commonly used types for convenient import.
//!
//! Use `use viewbridge_events::prelude::*;` to import all essential types.

// Event bus
pub use crate::{DEFAULT_CHANNEL_CAPACITY, Delivery, EventBus, EventReceiver};

// Events
pub use crate::{EventMetadata, HostEvent, LogoutReason, SessionStatus};
