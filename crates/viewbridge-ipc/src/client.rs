//! Webview-side client for a duplex channel.
//!
//! The UI surface owns request timeouts, so the timeout lives here and not
//! in the host router. A background reader task correlates responses to
//! pending requests by id and queues notifications.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::channel::{Endpoint, EndpointReceiver, EndpointSender};
use crate::envelope::{Envelope, Notification, Request, Response, classify};
use crate::error::{IpcError, IpcResult};

type PendingMap = Arc<DashMap<String, oneshot::Sender<Response>>>;

/// Client bound to the webview end of a duplex channel.
///
/// Must be created inside a Tokio runtime.
pub struct WebviewClient {
    sender: EndpointSender,
    pending: PendingMap,
    next_id: AtomicU64,
    timeout: Duration,
    notifications: Mutex<mpsc::UnboundedReceiver<Notification>>,
    reader: JoinHandle<()>,
}

impl WebviewClient {
    /// Bind a client to `endpoint`, applying `timeout` to every request.
    #[must_use]
    pub fn new(endpoint: Endpoint, timeout: Duration) -> Self {
        let (sender, receiver) = endpoint.split();
        let pending: PendingMap = Arc::new(DashMap::new());
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();
        let reader = tokio::spawn(reader_loop(receiver, Arc::clone(&pending), notify_tx));

        Self {
            sender,
            pending,
            next_id: AtomicU64::new(1),
            timeout,
            notifications: Mutex::new(notify_rx),
            reader,
        }
    }

    /// Send a request and wait for its response.
    ///
    /// # Errors
    ///
    /// - [`IpcError::Remote`] when the host answers with `error`.
    /// - [`IpcError::Timeout`] when no answer arrives in time. The request is
    ///   abandoned and a late answer is ignored.
    /// - [`IpcError::ChannelClosed`] when the host end is gone.
    pub async fn request(&self, method: &str, params: Option<Value>) -> IpcResult<Value> {
        let id = format!("wv-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id.clone(), tx);

        if self.sender.is_closed() {
            self.pending.remove(&id);
            return Err(IpcError::ChannelClosed);
        }
        self.sender
            .post_envelope(&Envelope::Request(Request::new(id.clone(), method, params)));
        trace!(id = %id, method, "request sent");

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(response)) => response.into_result().map_err(IpcError::Remote),
            Ok(Err(_)) => Err(IpcError::ChannelClosed),
            Err(_) => {
                self.pending.remove(&id);
                debug!(id = %id, method, "request timed out");
                Err(IpcError::Timeout {
                    method: method.to_owned(),
                    timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                })
            },
        }
    }

    /// Send a notification.
    pub fn notify(&self, method: &str, params: Option<Value>) {
        self.sender
            .post_envelope(&Envelope::Notification(Notification::new(method, params)));
    }

    /// Post a raw message without classification.
    pub fn post_raw(&self, message: Value) {
        self.sender.post(message);
    }

    /// Wait for the next notification from the host.
    ///
    /// Returns `None` once the host end is gone and the queue is drained.
    pub async fn next_notification(&self) -> Option<Notification> {
        self.notifications.lock().await.recv().await
    }

    /// Take a queued notification without waiting.
    pub fn try_next_notification(&self) -> Option<Notification> {
        self.notifications.try_lock().ok()?.try_recv().ok()
    }

    /// Number of requests still awaiting a response.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl Drop for WebviewClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

async fn reader_loop(
    mut receiver: EndpointReceiver,
    pending: PendingMap,
    notifications: mpsc::UnboundedSender<Notification>,
) {
    while let Some(raw) = receiver.recv().await {
        match classify(&raw) {
            Some(Envelope::Response(response)) => {
                if let Some((_, tx)) = pending.remove(&response.id) {
                    let _ = tx.send(response);
                } else {
                    debug!(id = %response.id, "no pending request for response");
                }
            },
            Some(Envelope::Notification(notification)) => {
                let _ = notifications.send(notification);
            },
            Some(Envelope::Request(request)) => {
                warn!(method = %request.method, "webview does not serve requests; ignoring");
            },
            None => {},
        }
    }

    debug!("host endpoint closed; failing pending requests");
    pending.clear();
}
