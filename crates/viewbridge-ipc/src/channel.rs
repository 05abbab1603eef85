//! In-process duplex message channel.
//!
//! Each endpoint sends to and receives from the other. Delivery is
//! asynchronous and ordered per direction. Dropping an endpoint is local:
//! posts toward it are silently discarded and the other side's receiver
//! yields `None`.

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::trace;

use crate::envelope::Envelope;

/// Factory for connected endpoint pairs.
pub struct DuplexChannel;

impl DuplexChannel {
    /// Create two connected endpoints `(a, b)`.
    #[must_use]
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (Endpoint, Endpoint) {
        let (a_tx, b_rx) = mpsc::unbounded_channel();
        let (b_tx, a_rx) = mpsc::unbounded_channel();
        (
            Endpoint {
                sender: EndpointSender { tx: a_tx },
                receiver: EndpointReceiver { rx: a_rx },
            },
            Endpoint {
                sender: EndpointSender { tx: b_tx },
                receiver: EndpointReceiver { rx: b_rx },
            },
        )
    }
}

/// One side of a duplex channel.
pub struct Endpoint {
    sender: EndpointSender,
    receiver: EndpointReceiver,
}

impl Endpoint {
    /// Post a raw message to the peer.
    pub fn post(&self, message: Value) {
        self.sender.post(message);
    }

    /// Receive the next raw message from the peer.
    pub async fn recv(&mut self) -> Option<Value> {
        self.receiver.recv().await
    }

    /// Split into independently owned send and receive halves.
    #[must_use]
    pub fn split(self) -> (EndpointSender, EndpointReceiver) {
        (self.sender, self.receiver)
    }
}

/// Sending half of an [`Endpoint`]. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EndpointSender {
    tx: mpsc::UnboundedSender<Value>,
}

impl EndpointSender {
    /// Post a raw message to the peer. Fire-and-forget.
    pub fn post(&self, message: Value) {
        if self.tx.send(message).is_err() {
            trace!("peer endpoint disposed; message dropped");
        }
    }

    /// Post an envelope to the peer.
    pub fn post_envelope(&self, envelope: &Envelope) {
        self.post(envelope.to_value());
    }

    /// Whether the peer's receiving half has been dropped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half of an [`Endpoint`].
#[derive(Debug)]
pub struct EndpointReceiver {
    rx: mpsc::UnboundedReceiver<Value>,
}

impl EndpointReceiver {
    /// Receive the next raw message, or `None` once the peer is gone.
    pub async fn recv(&mut self) -> Option<Value> {
        self.rx.recv().await
    }

    /// Receive without waiting.
    pub fn try_recv(&mut self) -> Option<Value> {
        self.rx.try_recv().ok()
    }
}
