//! Mock implementations for testing.
//!
//! All mocks use `std::sync::Mutex` internally so builder methods work
//! without a Tokio runtime.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::{Value, json};
use tokio::sync::{broadcast, watch};
use url::Url;
use viewbridge_host::{BridgeResult, EditorContextSource, SurfaceFactory, UiSurface, UrlOpener};
use viewbridge_ipc::{Endpoint, WebviewClient};
use viewbridge_session::{
    Authenticated, BackendConnection, BackendConnector, BackendError, LoginCredentials,
    LoginResult, LoginState,
};

use crate::fixtures::{TEST_EMAIL, TEST_PASSWORD, TEST_SIGNUP_TOKEN, test_login_state};

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// MockBackend
// ---------------------------------------------------------------------------

/// A call received by [`MockBackend`].
#[derive(Debug, Clone, PartialEq)]
pub struct BackendCall {
    /// Method as received.
    pub method: String,
    /// Params as received.
    pub params: Option<Value>,
}

/// Scripted [`BackendConnection`].
///
/// Methods without a scripted answer echo `{method, params}` back.
#[derive(Debug)]
pub struct MockBackend {
    responses: Mutex<HashMap<String, Result<Value, BackendError>>>,
    calls: Mutex<Vec<BackendCall>>,
    gate: watch::Sender<bool>,
    disconnects: AtomicUsize,
}

impl MockBackend {
    /// A backend that answers immediately.
    #[must_use]
    pub fn new() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            responses: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            gate,
            disconnects: AtomicUsize::new(0),
        }
    }

    /// Answer `method` with `result`.
    #[must_use]
    pub fn with_response(self, method: impl Into<String>, result: Value) -> Self {
        lock(&self.responses).insert(method.into(), Ok(result));
        self
    }

    /// Fail `method` with a remote error carrying `message`.
    #[must_use]
    pub fn with_error(self, method: impl Into<String>, message: impl Into<String>) -> Self {
        lock(&self.responses).insert(
            method.into(),
            Err(BackendError::Remote(message.into())),
        );
        self
    }

    /// Answer `method` with `result` from now on.
    pub fn set_response(&self, method: impl Into<String>, result: Value) {
        lock(&self.responses).insert(method.into(), Ok(result));
    }

    /// Fail `method` with a remote error from now on.
    pub fn set_error(&self, method: impl Into<String>, message: impl Into<String>) {
        lock(&self.responses).insert(method.into(), Err(BackendError::Remote(message.into())));
    }

    /// Hold every request until [`release`](Self::release).
    pub fn hold(&self) {
        self.gate.send_replace(false);
    }

    /// Let held requests complete.
    pub fn release(&self) {
        self.gate.send_replace(true);
    }

    /// Calls received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<BackendCall> {
        lock(&self.calls).clone()
    }

    /// Number of calls received so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Number of times the session disconnected this backend.
    #[must_use]
    pub fn disconnect_count(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BackendConnection for MockBackend {
    async fn send_request(&self, method: &str, params: Option<Value>) -> Result<Value, BackendError> {
        lock(&self.calls).push(BackendCall {
            method: method.to_owned(),
            params: params.clone(),
        });

        let mut gate = self.gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;

        lock(&self.responses)
            .get(method)
            .cloned()
            .unwrap_or_else(|| Ok(json!({"method": method, "params": params})))
    }

    async fn disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// MockConnector
// ---------------------------------------------------------------------------

/// [`BackendConnector`] accepting one password and one signup token.
///
/// Defaults to [`TEST_EMAIL`] / [`TEST_PASSWORD`] and
/// [`TEST_SIGNUP_TOKEN`], answering with [`test_login_state`].
#[derive(Debug)]
pub struct MockConnector {
    backend: Arc<MockBackend>,
    email: String,
    password: String,
    signup_token: String,
    state: LoginState,
    forced: Mutex<Option<LoginResult>>,
    delay: Option<Duration>,
    attempts: Mutex<Vec<LoginCredentials>>,
}

impl MockConnector {
    /// A connector handing out `backend` on success.
    #[must_use]
    pub fn new(backend: Arc<MockBackend>) -> Self {
        Self {
            backend,
            email: TEST_EMAIL.to_owned(),
            password: TEST_PASSWORD.to_owned(),
            signup_token: TEST_SIGNUP_TOKEN.to_owned(),
            state: test_login_state(),
            forced: Mutex::new(None),
            delay: None,
            attempts: Mutex::new(Vec::new()),
        }
    }

    /// Accept `email` / `password` instead of the defaults.
    #[must_use]
    pub fn with_password(mut self, email: impl Into<String>, password: impl Into<String>) -> Self {
        self.email = email.into();
        self.password = password.into();
        self
    }

    /// Accept `token` instead of [`TEST_SIGNUP_TOKEN`].
    #[must_use]
    pub fn with_signup_token(mut self, token: impl Into<String>) -> Self {
        self.signup_token = token.into();
        self
    }

    /// Report `state` on success.
    #[must_use]
    pub fn with_state(mut self, state: LoginState) -> Self {
        self.state = state;
        self
    }

    /// Wait `delay` before answering each attempt.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail every following attempt with `code`.
    pub fn force_result(&self, code: LoginResult) {
        *lock(&self.forced) = Some(code);
    }

    /// Credentials of every attempt so far.
    #[must_use]
    pub fn attempts(&self) -> Vec<LoginCredentials> {
        lock(&self.attempts).clone()
    }
}

#[async_trait]
impl BackendConnector for MockConnector {
    async fn connect(&self, credentials: LoginCredentials) -> Result<Authenticated, LoginResult> {
        lock(&self.attempts).push(credentials.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(code) = *lock(&self.forced) {
            return Err(code);
        }

        match credentials {
            LoginCredentials::Password { email, password }
                if email == self.email && password == self.password => {},
            LoginCredentials::Password { .. } => return Err(LoginResult::InvalidCredentials),
            LoginCredentials::SignupToken(token) if token == self.signup_token => {},
            LoginCredentials::SignupToken(_) => return Err(LoginResult::TokenInvalid),
        }

        let connection: Arc<dyn BackendConnection> = self.backend.clone();
        Ok(Authenticated {
            connection,
            state: self.state.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// MockUrlOpener
// ---------------------------------------------------------------------------

/// [`UrlOpener`] that records URLs instead of opening them.
#[derive(Debug, Default)]
pub struct MockUrlOpener {
    opened: Mutex<Vec<Url>>,
    refuse: AtomicBool,
}

impl MockUrlOpener {
    /// An opener that accepts every URL.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An opener that accepts nothing, as if no application were installed.
    #[must_use]
    pub fn refusing() -> Self {
        let opener = Self::default();
        opener.refuse.store(true, Ordering::SeqCst);
        opener
    }

    /// URLs opened so far.
    #[must_use]
    pub fn opened(&self) -> Vec<Url> {
        lock(&self.opened).clone()
    }
}

#[async_trait]
impl UrlOpener for MockUrlOpener {
    async fn open(&self, url: &Url) -> bool {
        if self.refuse.load(Ordering::SeqCst) {
            return false;
        }
        lock(&self.opened).push(url.clone());
        true
    }
}

// ---------------------------------------------------------------------------
// CapturingSurfaceFactory
// ---------------------------------------------------------------------------

/// Surface that only counts its release.
#[derive(Debug)]
pub struct CapturingSurface {
    releases: Arc<AtomicUsize>,
}

impl UiSurface for CapturingSurface {
    fn release(&mut self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// [`SurfaceFactory`] that binds a [`WebviewClient`] to every new surface's
/// endpoint and keeps it for the test.
pub struct CapturingSurfaceFactory {
    timeout: Duration,
    clients: Mutex<Vec<Arc<WebviewClient>>>,
    releases: Arc<AtomicUsize>,
}

impl CapturingSurfaceFactory {
    /// Clients time out requests after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            clients: Mutex::new(Vec::new()),
            releases: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Client of the most recently created surface.
    #[must_use]
    pub fn last_client(&self) -> Option<Arc<WebviewClient>> {
        lock(&self.clients).last().cloned()
    }

    /// Number of surfaces created.
    #[must_use]
    pub fn created(&self) -> usize {
        lock(&self.clients).len()
    }

    /// Number of surfaces released.
    #[must_use]
    pub fn released(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for CapturingSurfaceFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturingSurfaceFactory")
            .field("created", &self.created())
            .field("released", &self.released())
            .finish_non_exhaustive()
    }
}

impl Default for CapturingSurfaceFactory {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl SurfaceFactory for CapturingSurfaceFactory {
    fn create(&self, endpoint: Endpoint) -> BridgeResult<Box<dyn UiSurface>> {
        let client = Arc::new(WebviewClient::new(endpoint, self.timeout));
        lock(&self.clients).push(client);
        Ok(Box::new(CapturingSurface {
            releases: Arc::clone(&self.releases),
        }))
    }
}

// ---------------------------------------------------------------------------
// MockEditorSource
// ---------------------------------------------------------------------------

/// [`EditorContextSource`] driven by [`emit`](Self::emit).
#[derive(Debug)]
pub struct MockEditorSource {
    tx: broadcast::Sender<Value>,
    subscriptions: AtomicUsize,
}

impl MockEditorSource {
    /// A source with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            tx,
            subscriptions: AtomicUsize::new(0),
        }
    }

    /// Announce an active-editor change to every current stream.
    pub fn emit(&self, editor: Value) {
        let _ = self.tx.send(editor);
    }

    /// Number of streams handed out.
    #[must_use]
    pub fn subscriptions(&self) -> usize {
        self.subscriptions.load(Ordering::SeqCst)
    }
}

impl Default for MockEditorSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorContextSource for MockEditorSource {
    fn active_editor_changes(&self) -> BoxStream<'static, Value> {
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        let rx = self.tx.subscribe();
        stream::unfold(rx, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(value) => return Some((value, rx)),
                    Err(broadcast::error::RecvError::Lagged(_)) => {},
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        })
        .boxed()
    }
}
