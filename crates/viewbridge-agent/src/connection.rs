//! JSON-RPC connection to an agent over framed byte streams.
//!
//! A single reader task owns the inbound half. It fulfils pending requests
//! by id, republishes agent notifications onto the [`EventBus`] and rejects
//! agent-initiated requests. Writes are serialized through a mutex.
//!
//! Frames whose body is not JSON are dropped. If the agent's output ends
//! without [`AgentConnection::shutdown`], a `BackendDidLogout` is published
//! so the session signs out.

use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use viewbridge_events::{EventBus, EventMetadata, HostEvent, LogoutReason};
use viewbridge_session::{BackendConnection, BackendError};

use crate::error::{AgentError, AgentResult};
use crate::framing::{read_message, write_message};
use crate::protocol::{
    self, JsonRpcMessage, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
};

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;
type PendingMap = Arc<DashMap<u64, oneshot::Sender<JsonRpcResponse>>>;

/// A live connection to one agent.
pub struct AgentConnection {
    writer: Mutex<BoxedWriter>,
    pending: PendingMap,
    next_id: AtomicU64,
    closed: Arc<AtomicBool>,
    cancel: CancellationToken,
    child: Mutex<Option<Child>>,
}

impl std::fmt::Debug for AgentConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentConnection")
            .field("pending", &self.pending.len())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl AgentConnection {
    /// Spawn `program` and speak JSON-RPC over its stdio.
    ///
    /// The agent's stderr is forwarded to the log at debug level.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Spawn`] if the process cannot start.
    pub fn spawn(program: &str, args: &[String], bus: EventBus) -> AgentResult<Arc<Self>> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| AgentError::Spawn {
                program: program.to_owned(),
                source,
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| AgentError::Protocol("agent stdin unavailable".to_owned()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AgentError::Protocol("agent stdout unavailable".to_owned()))?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(target: "viewbridge_agent::stderr", "{line}");
                }
            });
        }

        info!(program, pid = child.id(), "agent started");
        Ok(Self::from_parts(stdout, stdin, bus, Some(child)))
    }

    /// Speak JSON-RPC over an arbitrary stream pair.
    ///
    /// Must be called inside a Tokio runtime.
    #[must_use]
    pub fn from_streams<R, W>(reader: R, writer: W, bus: EventBus) -> Arc<Self>
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self::from_parts(reader, writer, bus, None)
    }

    fn from_parts<R, W>(reader: R, writer: W, bus: EventBus, child: Option<Child>) -> Arc<Self>
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let pending: PendingMap = Arc::new(DashMap::new());
        let closed = Arc::new(AtomicBool::new(false));
        let cancel = CancellationToken::new();

        let connection = Arc::new(Self {
            writer: Mutex::new(Box::new(writer)),
            pending: Arc::clone(&pending),
            next_id: AtomicU64::new(1),
            closed: Arc::clone(&closed),
            cancel: cancel.clone(),
            child: Mutex::new(child),
        });

        let weak = Arc::downgrade(&connection);
        tokio::spawn(async move {
            let mut reader = BufReader::new(reader);
            loop {
                let frame = tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    frame = read_message(&mut reader) => frame,
                };
                match frame {
                    Ok(Some(raw)) => {
                        if let Some(rejection) = dispatch(raw, &pending, &bus)
                            && let Some(conn) = weak.upgrade()
                            && let Err(e) = conn.write(&rejection).await
                        {
                            debug!(error = %e, "failed to reject agent request");
                        }
                    },
                    Err(AgentError::MalformedMessage(e)) => {
                        warn!(error = %e, "dropping malformed agent frame");
                    },
                    Ok(None) => {
                        info!("agent closed its output");
                        break;
                    },
                    Err(e) => {
                        warn!(error = %e, "agent stream failed");
                        break;
                    },
                }
            }
            closed.store(true, Ordering::SeqCst);
            pending.clear();

            // Shutdown was not requested, so the backend session is gone.
            if !cancel.is_cancelled() {
                bus.publish(HostEvent::BackendDidLogout {
                    metadata: EventMetadata::new("agent"),
                    reason: LogoutReason::Unknown,
                });
            }
        });

        connection
    }

    /// Send a request and wait for its result.
    ///
    /// # Errors
    ///
    /// - [`AgentError::Rpc`] when the agent answers with an error.
    /// - [`AgentError::Closed`] when the connection ends first.
    pub async fn request(&self, method: &str, params: Option<Value>) -> AgentResult<Value> {
        if self.is_closed() {
            return Err(AgentError::Closed);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);
        // The reader marks the connection closed before clearing the map.
        if self.is_closed() {
            self.pending.remove(&id);
            return Err(AgentError::Closed);
        }

        let request = serde_json::to_value(JsonRpcRequest::new(id, method, params))?;
        if let Err(e) = self.write(&request).await {
            self.pending.remove(&id);
            return Err(e);
        }
        trace!(id, method, "agent request sent");

        let response = rx.await.map_err(|_| AgentError::Closed)?;
        if let Some(error) = response.error {
            return Err(AgentError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        Ok(response.result.unwrap_or(Value::Null))
    }

    /// Send a notification.
    ///
    /// # Errors
    ///
    /// Returns I/O errors, or [`AgentError::Closed`].
    pub async fn notify(&self, method: &str, params: Option<Value>) -> AgentResult<()> {
        if self.is_closed() {
            return Err(AgentError::Closed);
        }
        let note = serde_json::to_value(JsonRpcNotification::new(method, params))?;
        self.write(&note).await
    }

    /// Whether the connection has ended.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Stop the reader, fail pending requests and kill the agent process.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.closed.store(true, Ordering::SeqCst);
        self.pending.clear();
        if let Some(mut child) = self.child.lock().await.take() {
            if let Err(e) = child.kill().await {
                debug!(error = %e, "agent already exited");
            }
            info!("agent stopped");
        }
    }

    async fn write(&self, message: &Value) -> AgentResult<()> {
        let mut writer = self.writer.lock().await;
        write_message(&mut *writer, message).await
    }
}

#[async_trait]
impl BackendConnection for AgentConnection {
    async fn send_request(&self, method: &str, params: Option<Value>) -> Result<Value, BackendError> {
        self.request(method, params).await.map_err(BackendError::from)
    }

    async fn disconnect(&self) {
        self.shutdown().await;
    }
}

/// Route one inbound message. Returns a reply to write for agent requests.
fn dispatch(raw: Value, pending: &PendingMap, bus: &EventBus) -> Option<Value> {
    let message: JsonRpcMessage = match serde_json::from_value(raw) {
        Ok(m) => m,
        Err(e) => {
            warn!(error = %e, "dropping malformed agent message");
            return None;
        },
    };

    match message {
        JsonRpcMessage::Response(response) => {
            let Some(id) = response.id.as_u64() else {
                warn!(id = %response.id, "agent response with non-numeric id");
                return None;
            };
            if let Some((_, tx)) = pending.remove(&id) {
                let _ = tx.send(response);
            } else {
                debug!(id, "no pending request for agent response");
            }
            None
        },
        JsonRpcMessage::Notification(note) => {
            if let Some(event) = map_notification(&note.method, note.params) {
                bus.publish(event);
            } else {
                trace!(method = %note.method, "ignoring agent notification");
            }
            None
        },
        JsonRpcMessage::Request(request) => {
            debug!(method = %request.method, "rejecting agent request");
            serde_json::to_value(JsonRpcResponse::error(
                request.id,
                protocol::METHOD_NOT_FOUND,
                format!("method '{}' not supported by host", request.method),
            ))
            .ok()
        },
    }
}

/// Translate an agent notification into a host event.
///
/// Login lifecycle notifications map to nothing: the session learns the
/// outcome from the `codestream/login` response it is awaiting.
#[must_use]
pub fn map_notification(method: &str, params: Option<Value>) -> Option<HostEvent> {
    let metadata = EventMetadata::new("agent");
    let payload = params.unwrap_or(Value::Null);
    match method {
        protocol::DID_CHANGE_DATA => Some(HostEvent::BackendDataChanged { metadata, payload }),
        protocol::DID_CHANGE_CONNECTION_STATUS => {
            Some(HostEvent::BackendConnectionStatusChanged { metadata, payload })
        },
        protocol::DID_CHANGE_VERSION_COMPATIBILITY => {
            Some(HostEvent::BackendVersionCompatibilityChanged { metadata, payload })
        },
        protocol::DID_CHANGE_DOCUMENT_MARKERS => {
            Some(HostEvent::BackendDocumentMarkersChanged { metadata, payload })
        },
        protocol::DID_LOGOUT => {
            let reason = payload
                .get("reason")
                .cloned()
                .and_then(|r| serde_json::from_value::<LogoutReason>(r).ok())
                .unwrap_or_default();
            Some(HostEvent::BackendDidLogout { metadata, reason })
        },
        protocol::DID_START_LOGIN | protocol::DID_LOGIN | protocol::DID_FAIL_LOGIN => {
            debug!(method, "login lifecycle handled by the session");
            None
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf};

    struct FakeAgent {
        reader: BufReader<ReadHalf<DuplexStream>>,
        writer: WriteHalf<DuplexStream>,
    }

    impl FakeAgent {
        async fn next(&mut self) -> Value {
            read_message(&mut self.reader).await.unwrap().unwrap()
        }

        async fn send(&mut self, message: Value) {
            write_message(&mut self.writer, &message).await.unwrap();
        }
    }

    fn connect(bus: EventBus) -> (Arc<AgentConnection>, FakeAgent) {
        let (host_io, agent_io) = tokio::io::duplex(64 * 1024);
        let (host_r, host_w) = tokio::io::split(host_io);
        let (agent_r, agent_w) = tokio::io::split(agent_io);
        (
            AgentConnection::from_streams(host_r, host_w, bus),
            FakeAgent {
                reader: BufReader::new(agent_r),
                writer: agent_w,
            },
        )
    }

    #[tokio::test]
    async fn test_request_round_trip() {
        let (conn, mut agent) = connect(EventBus::new());

        let call = tokio::spawn({
            let conn = Arc::clone(&conn);
            async move { conn.request("codeStream/posts", Some(json!({"n": 1}))).await }
        });

        let req = agent.next().await;
        assert_eq!(req["method"], json!("codeStream/posts"));
        assert_eq!(req["params"], json!({"n": 1}));
        agent
            .send(json!({"jsonrpc": "2.0", "id": req["id"], "result": {"posts": []}}))
            .await;

        assert_eq!(call.await.unwrap().unwrap(), json!({"posts": []}));
    }

    #[tokio::test]
    async fn test_out_of_order_responses() {
        let (conn, mut agent) = connect(EventBus::new());

        let a = tokio::spawn({
            let conn = Arc::clone(&conn);
            async move { conn.request("a", None).await }
        });
        let first = agent.next().await;
        let b = tokio::spawn({
            let conn = Arc::clone(&conn);
            async move { conn.request("b", None).await }
        });
        let second = agent.next().await;

        agent
            .send(json!({"jsonrpc": "2.0", "id": second["id"], "result": "b"}))
            .await;
        agent
            .send(json!({"jsonrpc": "2.0", "id": first["id"], "result": "a"}))
            .await;

        assert_eq!(a.await.unwrap().unwrap(), json!("a"));
        assert_eq!(b.await.unwrap().unwrap(), json!("b"));
    }

    #[tokio::test]
    async fn test_rpc_error_surfaces_message() {
        let (conn, mut agent) = connect(EventBus::new());
        let call = tokio::spawn({
            let conn = Arc::clone(&conn);
            async move { conn.send_request("codeStream/fail", None).await }
        });

        let req = agent.next().await;
        agent
            .send(json!({
                "jsonrpc": "2.0",
                "id": req["id"],
                "error": {"code": -32000, "message": "stream not found"}
            }))
            .await;

        assert_eq!(
            call.await.unwrap(),
            Err(BackendError::Remote("stream not found".to_owned()))
        );
    }

    #[tokio::test]
    async fn test_notifications_reach_the_bus() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let (_conn, mut agent) = connect(bus);

        agent
            .send(json!({
                "jsonrpc": "2.0",
                "method": "codestream/didChangeData",
                "params": {"type": "posts", "data": []}
            }))
            .await;
        agent
            .send(json!({
                "jsonrpc": "2.0",
                "method": "codestream/didLogout",
                "params": {"reason": "token"}
            }))
            .await;

        let first = rx.recv().await.unwrap();
        assert!(matches!(&*first, HostEvent::BackendDataChanged { payload, .. } if payload["type"] == "posts"));
        let second = rx.recv().await.unwrap();
        assert!(matches!(
            &*second,
            HostEvent::BackendDidLogout { reason: LogoutReason::Token, .. }
        ));
    }

    #[tokio::test]
    async fn test_agent_requests_are_rejected() {
        let (_conn, mut agent) = connect(EventBus::new());
        agent
            .send(json!({"jsonrpc": "2.0", "id": 99, "method": "workspace/configuration"}))
            .await;

        let reply = agent.next().await;
        assert_eq!(reply["id"], json!(99));
        assert_eq!(reply["error"]["code"], json!(protocol::METHOD_NOT_FOUND));
    }

    #[tokio::test]
    async fn test_pending_requests_fail_when_agent_exits() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let (conn, mut agent) = connect(bus);
        let call = tokio::spawn({
            let conn = Arc::clone(&conn);
            async move { conn.request("codeStream/slow", None).await }
        });
        let _ = agent.next().await;
        drop(agent);

        assert!(matches!(call.await.unwrap(), Err(AgentError::Closed)));
        assert!(conn.is_closed());
        assert!(matches!(conn.request("x", None).await, Err(AgentError::Closed)));

        let event = rx.recv().await.unwrap();
        assert!(matches!(
            &*event,
            HostEvent::BackendDidLogout { reason: LogoutReason::Unknown, .. }
        ));
    }

    #[tokio::test]
    async fn test_shutdown_does_not_report_logout() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let (conn, agent) = connect(bus);

        conn.shutdown().await;
        drop(agent);
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        assert!(conn.is_closed());
        assert!(rx.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_malformed_frame_is_dropped() {
        let (conn, mut agent) = connect(EventBus::new());
        let call = tokio::spawn({
            let conn = Arc::clone(&conn);
            async move { conn.request("codeStream/posts", None).await }
        });
        let req = agent.next().await;

        agent
            .writer
            .write_all(b"Content-Length: 9\r\n\r\n{not json")
            .await
            .unwrap();
        agent
            .send(json!({"jsonrpc": "2.0", "id": req["id"], "result": {"posts": []}}))
            .await;

        assert_eq!(call.await.unwrap().unwrap(), json!({"posts": []}));
        assert!(!conn.is_closed());
    }

    #[test]
    fn test_map_notification_ignores_unknown_methods() {
        assert!(map_notification("codestream/didChangeSomethingElse", None).is_none());
        for method in [protocol::DID_START_LOGIN, protocol::DID_LOGIN, protocol::DID_FAIL_LOGIN] {
            assert!(map_notification(method, Some(json!({}))).is_none());
        }
        let markers = json!({"textDocument": {"uri": "file:///a.rs"}, "reason": "codemarks"});
        assert!(matches!(
            map_notification(protocol::DID_CHANGE_DOCUMENT_MARKERS, Some(markers.clone())),
            Some(HostEvent::BackendDocumentMarkersChanged { payload, .. }) if payload == markers
        ));
        assert!(matches!(
            map_notification("codestream/didLogout", Some(json!({}))),
            Some(HostEvent::BackendDidLogout { reason: LogoutReason::Unknown, .. })
        ));
    }
}
