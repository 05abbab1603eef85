//! One webview: its channel, surface, routers and teardown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;
use viewbridge_events::SessionStatus;
use viewbridge_ipc::protocol::{ShowStreamNotification, host};
use viewbridge_ipc::{DuplexChannel, EndpointReceiver, Envelope, Notification, classify};

use crate::context::BridgeContext;
use crate::error::BridgeResult;
use crate::notification_router::NotificationRouter;
use crate::ready::ReadyLatch;
use crate::request_router::RequestRouter;
use crate::routes::RouteTable;
use crate::surface::{SurfaceFactory, UiSurface};
use crate::view_context::ViewContext;

/// Descriptor a host stores to restore a view later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedView {
    /// Name of the deserializer that recreates the view.
    pub deserializer: String,
}

type WillDestroyCallback = Box<dyn Fn(&Map<String, Value>) + Send + Sync>;

/// A live webview wired to the shared session and config.
///
/// Dropping the view destroys it.
pub struct WebviewView {
    id: Uuid,
    ctx: BridgeContext,
    notifications: NotificationRouter,
    view_context: ViewContext,
    ready: ReadyLatch,
    cancel: CancellationToken,
    alive: AtomicBool,
    surface: Mutex<Option<Box<dyn UiSurface>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    will_destroy: Mutex<Vec<WillDestroyCallback>>,
}

impl std::fmt::Debug for WebviewView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebviewView")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .field("ready", &self.ready.is_open())
            .finish_non_exhaustive()
    }
}

impl WebviewView {
    /// Create a view: open a channel, bind a new surface to its webview end
    /// and start routing on the host end.
    ///
    /// `context_override` seeds the UI context merged into every bootstrap
    /// response. Must be called inside a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface cannot be created.
    pub fn new(
        ctx: BridgeContext,
        factory: &dyn SurfaceFactory,
        context_override: Option<Map<String, Value>>,
    ) -> BridgeResult<Self> {
        let id = Uuid::new_v4();
        let (host_end, webview_end) = DuplexChannel::new();
        let surface = factory.create(webview_end)?;
        let (outbound, inbound) = host_end.split();

        let view_context = ViewContext::new(context_override.unwrap_or_default());
        let ready = ReadyLatch::new();
        let cancel = CancellationToken::new();

        let requests = RequestRouter::new(
            ctx.clone(),
            Arc::new(RouteTable::standard(&ctx.settings().backend_namespace)),
            outbound.clone(),
            view_context.clone(),
            id,
            cancel.clone(),
        );
        let notifications = NotificationRouter::new(
            outbound,
            view_context.clone(),
            ready.clone(),
            ctx.editor_source().cloned(),
            id,
            cancel.clone(),
        );

        let forwarder = notifications.spawn_forwarder(ctx.bus().subscribe(), {
            let ctx = ctx.clone();
            move || resync_notifications(&ctx)
        });
        let listener = tokio::spawn(listen(
            inbound,
            requests,
            notifications.clone(),
            cancel.clone(),
        ));
        info!(view_id = %id, "view created");

        Ok(Self {
            id,
            ctx,
            notifications,
            view_context,
            ready,
            cancel,
            alive: AtomicBool::new(true),
            surface: Mutex::new(Some(surface)),
            tasks: Mutex::new(vec![forwarder, listener]),
            will_destroy: Mutex::new(Vec::new()),
        })
    }

    /// View id used in logs.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Whether [`destroy`](Self::destroy) has not run yet.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Whether the webview has reported `webview/didInitialize`.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.is_open()
    }

    /// Current UI context.
    #[must_use]
    pub fn context(&self) -> Map<String, Value> {
        self.view_context.snapshot()
    }

    /// Focus a stream, once the webview is ready.
    ///
    /// Sends `host/showStream` after readiness, immediately if already
    /// ready. Without a stream id nothing is sent.
    pub fn show(&self, stream_id: Option<String>, thread_id: Option<String>) {
        if !self.is_alive() {
            debug!(view_id = %self.id, "show on destroyed view ignored");
            return;
        }
        let Some(stream_id) = stream_id else {
            return;
        };

        let params = ShowStreamNotification {
            stream_id: Some(stream_id),
            thread_id,
        };
        let notifications = self.notifications.clone();
        let ready = self.ready.clone();
        let cancel = self.cancel.clone();
        let task = tokio::spawn(async move {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {},
                () = ready.wait() => match serde_json::to_value(&params) {
                    Ok(params) => {
                        notifications.post(Notification::new(host::SHOW_STREAM, Some(params)));
                    },
                    Err(e) => debug!(error = %e, "could not encode showStream"),
                },
            }
        });
        let mut tasks = self.lock_tasks();
        tasks.retain(|t| !t.is_finished());
        tasks.push(task);
    }

    /// Restore descriptor for this view.
    #[must_use]
    pub fn serialize(&self) -> SerializedView {
        SerializedView {
            deserializer: self.ctx.settings().deserializer.clone(),
        }
    }

    /// Register a callback run with the current UI context just before the
    /// view is destroyed.
    pub fn on_will_destroy(&self, callback: impl Fn(&Map<String, Value>) + Send + Sync + 'static) {
        if !self.is_alive() {
            debug!(view_id = %self.id, "view already destroyed; callback dropped");
            return;
        }
        self.will_destroy
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(callback));
    }

    /// Tear the view down.
    ///
    /// Runs will-destroy callbacks, releases the surface, then stops every
    /// subscription and in-flight request. Later calls do nothing.
    pub fn destroy(&self) {
        if !self.alive.swap(false, Ordering::SeqCst) {
            return;
        }

        let context = self.view_context.snapshot();
        let callbacks = std::mem::take(
            &mut *self
                .will_destroy
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for callback in &callbacks {
            callback(&context);
        }

        if let Some(mut surface) = self
            .surface
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            surface.release();
        }

        self.cancel.cancel();
        for task in self.lock_tasks().drain(..) {
            task.abort();
        }
        info!(view_id = %self.id, "view destroyed");
    }

    fn lock_tasks(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for WebviewView {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// State a view re-reads after its forwarder lost events.
fn resync_notifications(ctx: &BridgeContext) -> Vec<Notification> {
    let mut out = vec![Notification::new(
        host::DID_CHANGE_CONFIG,
        Some(Value::Object(ctx.config().webview_snapshot())),
    )];
    if ctx.session().status() == SessionStatus::SignedOut {
        out.push(Notification::new(host::DID_LOGOUT, Some(Value::Object(Map::new()))));
    }
    out
}

async fn listen(
    mut inbound: EndpointReceiver,
    requests: RequestRouter,
    notifications: NotificationRouter,
    cancel: CancellationToken,
) {
    loop {
        let raw = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            raw = inbound.recv() => raw,
        };
        let Some(raw) = raw else {
            debug!("webview endpoint closed");
            break;
        };
        match classify(&raw) {
            Some(Envelope::Request(request)) => {
                // Request tasks stop on cancellation; the handle is not kept.
                drop(requests.dispatch(request));
            },
            Some(Envelope::Notification(notification)) => notifications.handle(notification),
            Some(Envelope::Response(response)) => {
                debug!(id = %response.id, "unexpected response from webview");
            },
            None => {},
        }
    }
}
