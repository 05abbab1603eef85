//! Event bus for broadcasting host events to webview views.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

use crate::event::HostEvent;

/// Default channel capacity for the event bus.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Event bus for broadcasting host events to all subscribers.
///
/// The event bus uses a broadcast channel to deliver events to all
/// connected receivers. Events are delivered asynchronously and in order.
/// Cloning the bus yields another handle onto the same channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    /// Sender for broadcasting events.
    sender: broadcast::Sender<Arc<HostEvent>>,
    /// Channel capacity.
    capacity: usize,
}

impl EventBus {
    /// Create a new event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new event bus with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender, capacity }
    }

    /// Publish an event to all subscribers.
    ///
    /// Returns the number of receivers that received the event.
    pub fn publish(&self, event: HostEvent) -> usize {
        let event = Arc::new(event);

        trace!(event_type = %event.event_type(), "Publishing event");

        if let Ok(count) = self.sender.send(Arc::clone(&event)) {
            debug!(
                event_type = %event.event_type(),
                receiver_count = count,
                "Event published"
            );
            count
        } else {
            // No receivers - this is fine
            trace!(event_type = %event.event_type(), "No receivers for event");
            0
        }
    }

    /// Subscribe to events.
    ///
    /// Returns a receiver that will receive all events published after this
    /// call.
    #[must_use]
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver::new(self.sender.subscribe())
    }

    /// Get the current number of active receivers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// One step of an [`EventReceiver`].
#[derive(Debug, Clone)]
pub enum Delivery {
    /// The next event.
    Event(Arc<HostEvent>),
    /// This many events were overwritten before they could be read.
    Lagged(u64),
}

/// Receiver for events from the event bus.
pub struct EventReceiver {
    receiver: broadcast::Receiver<Arc<HostEvent>>,
}

impl EventReceiver {
    pub(crate) fn new(receiver: broadcast::Receiver<Arc<HostEvent>>) -> Self {
        Self { receiver }
    }

    /// Receive the next event.
    ///
    /// Lagged events are logged and skipped. Returns `None` once every
    /// [`EventBus`] handle has been dropped.
    pub async fn recv(&mut self) -> Option<Arc<HostEvent>> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(skipped = count, "Event receiver lagged, events dropped");
                },
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Receive the next event, reporting lag instead of skipping it.
    ///
    /// Subscribers that mirror state use this to resynchronize after
    /// missing events. Returns `None` once every [`EventBus`] handle has been
    /// dropped.
    pub async fn recv_delivery(&mut self) -> Option<Delivery> {
        match self.receiver.recv().await {
            Ok(event) => Some(Delivery::Event(event)),
            Err(broadcast::error::RecvError::Lagged(count)) => {
                warn!(skipped = count, "Event receiver lagged, events dropped");
                Some(Delivery::Lagged(count))
            },
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }

    /// Try to receive the next event without blocking.
    ///
    /// Returns `Some(event)` if an event is available, or `None` if no event
    /// is available or the channel is closed.
    pub fn try_recv(&mut self) -> Option<Arc<HostEvent>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    warn!(skipped = count, "Event receiver lagged, events dropped");
                },
                Err(
                    broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed,
                ) => return None,
            }
        }
    }
}
