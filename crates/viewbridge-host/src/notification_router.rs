//! Host events out, webview notifications in.
//!
//! Outbound, host events from the bus are translated by [`to_webview`] and
//! posted to the view. Inbound, `webview/didInitialize` opens the view's
//! ready latch and arms post-ready work once; `webview/didChangeContext`
//! replaces the mirrored UI context.

use std::sync::Arc;

use futures::StreamExt;
use serde_json::{Map, Value};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;
use viewbridge_events::{Delivery, EventReceiver, HostEvent, SessionStatus};
use viewbridge_ipc::protocol::{DidChangeContextNotification, host, webview};
use viewbridge_ipc::{EndpointSender, Envelope, Notification};

use crate::environment::EditorContextSource;
use crate::ready::ReadyLatch;
use crate::view_context::ViewContext;

/// Translate a host event into the notification a webview should see.
#[must_use]
pub fn to_webview(event: &HostEvent) -> Option<Notification> {
    match event {
        HostEvent::BackendDataChanged { payload, .. } => Some(Notification::new(
            host::DID_CHANGE_DATA,
            Some(payload.clone()),
        )),
        HostEvent::BackendConnectionStatusChanged { payload, .. } => Some(Notification::new(
            host::DID_CHANGE_CONNECTION_STATUS,
            Some(payload.clone()),
        )),
        HostEvent::BackendVersionCompatibilityChanged { payload, .. } => Some(Notification::new(
            host::DID_CHANGE_VERSION_COMPATIBILITY,
            Some(payload.clone()),
        )),
        HostEvent::BackendDocumentMarkersChanged { payload, .. } => Some(Notification::new(
            host::DID_CHANGE_DOCUMENT_MARKERS,
            Some(payload.clone()),
        )),
        HostEvent::SessionStatusChanged {
            status: SessionStatus::SignedOut,
            reason: Some(_),
            ..
        } => Some(Notification::new(
            host::DID_LOGOUT,
            Some(Value::Object(Map::new())),
        )),
        HostEvent::ConfigChanged {
            changes,
            webview_visible: true,
            ..
        } => Some(Notification::new(
            host::DID_CHANGE_CONFIG,
            Some(Value::Object(changes.clone())),
        )),
        HostEvent::SessionStatusChanged { .. }
        | HostEvent::ConfigChanged { .. }
        | HostEvent::BackendDidLogout { .. } => None,
    }
}

/// Notification plumbing for one view.
#[derive(Clone)]
pub struct NotificationRouter {
    outbound: EndpointSender,
    view_context: ViewContext,
    ready: ReadyLatch,
    editor: Option<Arc<dyn EditorContextSource>>,
    view_id: Uuid,
    cancel: CancellationToken,
}

impl NotificationRouter {
    /// Create a router posting on `outbound`.
    ///
    /// Cancelling `cancel` stops every task the router started.
    #[must_use]
    pub fn new(
        outbound: EndpointSender,
        view_context: ViewContext,
        ready: ReadyLatch,
        editor: Option<Arc<dyn EditorContextSource>>,
        view_id: Uuid,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            outbound,
            view_context,
            ready,
            editor,
            view_id,
            cancel,
        }
    }

    /// Forward bus events to the webview until cancelled.
    ///
    /// When the receiver lags, the notifications produced by `resync` are
    /// posted in place of the events that were lost.
    pub fn spawn_forwarder<F>(&self, mut events: EventReceiver, resync: F) -> JoinHandle<()>
    where
        F: Fn() -> Vec<Notification> + Send + 'static,
    {
        let router = self.clone();
        tokio::spawn(async move {
            loop {
                let delivery = tokio::select! {
                    biased;
                    () = router.cancel.cancelled() => break,
                    delivery = events.recv_delivery() => delivery,
                };
                let event = match delivery {
                    Some(Delivery::Event(event)) => event,
                    Some(Delivery::Lagged(skipped)) => {
                        warn!(view_id = %router.view_id, skipped, "view fell behind, resyncing");
                        for notification in resync() {
                            router.post(notification);
                        }
                        continue;
                    },
                    None => {
                        debug!(view_id = %router.view_id, "event bus closed");
                        break;
                    },
                };
                if let Some(notification) = to_webview(&event) {
                    router.post(notification);
                } else {
                    trace!(event_type = event.event_type(), "event not forwarded");
                }
            }
        })
    }

    /// Handle a notification sent by the webview.
    pub fn handle(&self, notification: Notification) {
        match notification.method.as_str() {
            webview::DID_INITIALIZE => {
                if self.ready.open() {
                    info!(view_id = %self.view_id, "webview ready");
                    self.arm_post_ready();
                } else {
                    debug!(view_id = %self.view_id, "repeated didInitialize ignored");
                }
            },
            webview::DID_CHANGE_CONTEXT => {
                let params = notification.params.unwrap_or(Value::Null);
                match serde_json::from_value::<DidChangeContextNotification>(params) {
                    Ok(DidChangeContextNotification {
                        context: Value::Object(context),
                    }) => self.view_context.replace(context),
                    Ok(DidChangeContextNotification {
                        context: Value::Null,
                    }) => self.view_context.replace(Map::new()),
                    Ok(_) => warn!("didChangeContext with non-object context ignored"),
                    Err(e) => warn!(error = %e, "malformed didChangeContext ignored"),
                }
            },
            other => debug!(method = other, "unhandled webview notification"),
        }
    }

    /// Post a notification unless the view is gone.
    pub fn post(&self, notification: Notification) {
        if self.cancel.is_cancelled() {
            return;
        }
        trace!(method = %notification.method, "notifying webview");
        self.outbound
            .post_envelope(&Envelope::Notification(notification));
    }

    fn arm_post_ready(&self) {
        let Some(editor) = &self.editor else {
            return;
        };
        let mut changes = editor.active_editor_changes();
        let router = self.clone();
        tokio::spawn(async move {
            loop {
                let change = tokio::select! {
                    biased;
                    () = router.cancel.cancelled() => break,
                    change = changes.next() => change,
                };
                let Some(change) = change else { break };
                router.post(Notification::new(
                    host::DID_CHANGE_ACTIVE_EDITOR,
                    Some(change),
                ));
            }
        });
    }
}
