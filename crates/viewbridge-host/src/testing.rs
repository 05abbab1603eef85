//! In-crate fakes for unit tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use url::Url;
use viewbridge_config::ConfigStore;
use viewbridge_events::EventBus;
use viewbridge_ipc::{DuplexChannel, Endpoint, EndpointReceiver, EndpointSender};
use viewbridge_session::{
    Authenticated, BackendConnection, BackendConnector, BackendError, Environment,
    LoginCredentials, LoginResult, LoginState, SessionManager,
};

use crate::context::{BridgeContext, BridgeSettings};
use crate::environment::UrlOpener;
use crate::error::BridgeResult;
use crate::surface::{SurfaceFactory, UiSurface};

pub(crate) struct Echo;

#[async_trait]
impl BackendConnection for Echo {
    async fn send_request(&self, method: &str, params: Option<Value>) -> Result<Value, BackendError> {
        Ok(json!({"method": method, "params": params}))
    }
}

pub(crate) struct Connector;

#[async_trait]
impl BackendConnector for Connector {
    async fn connect(&self, credentials: LoginCredentials) -> Result<Authenticated, LoginResult> {
        let ok = match &credentials {
            LoginCredentials::Password { email, password } => {
                email == "dev@example.com" && password == "secret"
            },
            LoginCredentials::SignupToken(token) => token == "good",
        };
        if !ok {
            return Err(match credentials {
                LoginCredentials::Password { .. } => LoginResult::InvalidCredentials,
                LoginCredentials::SignupToken(_) => LoginResult::TokenInvalid,
            });
        }
        Ok(Authenticated {
            connection: Arc::new(Echo),
            state: LoginState {
                user_id: "u1".to_owned(),
                ..LoginState::default()
            },
        })
    }
}

pub(crate) struct Opener {
    opened: Arc<Mutex<Vec<String>>>,
    refuse: Arc<AtomicBool>,
}

#[async_trait]
impl UrlOpener for Opener {
    async fn open(&self, url: &Url) -> bool {
        if self.refuse.load(Ordering::SeqCst) {
            return false;
        }
        self.opened.lock().unwrap().push(url.to_string());
        true
    }
}

pub(crate) struct HeldSurface {
    released: Arc<AtomicBool>,
}

impl UiSurface for HeldSurface {
    fn release(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

/// Hands the webview endpoint back to the test through a slot.
#[derive(Default)]
pub(crate) struct SlotFactory {
    pub(crate) endpoint: Mutex<Option<Endpoint>>,
    pub(crate) released: Arc<AtomicBool>,
}

impl SurfaceFactory for SlotFactory {
    fn create(&self, endpoint: Endpoint) -> BridgeResult<Box<dyn UiSurface>> {
        *self.endpoint.lock().unwrap() = Some(endpoint);
        Ok(Box::new(HeldSurface {
            released: Arc::clone(&self.released),
        }))
    }
}

pub(crate) struct Harness {
    pub(crate) ctx: BridgeContext,
    pub(crate) outbound: EndpointSender,
    pub(crate) inbound: EndpointReceiver,
    pub(crate) context_override: Map<String, Value>,
    pub(crate) opened: Arc<Mutex<Vec<String>>>,
    refuse: Arc<AtomicBool>,
}

impl Harness {
    pub(crate) async fn sign_in(&self) {
        let code = self.ctx.session().login("dev@example.com", "secret").await;
        assert_eq!(code, LoginResult::Success);
    }

    pub(crate) fn refuse_urls(&self) {
        self.refuse.store(true, Ordering::SeqCst);
    }
}

pub(crate) fn context() -> (BridgeContext, Arc<Mutex<Vec<String>>>, Arc<AtomicBool>) {
    let bus = EventBus::new();
    let store = Arc::new(ConfigStore::new(bus.clone()));
    let session = Arc::new(SessionManager::new(
        Arc::new(Connector),
        store,
        bus.clone(),
        Environment {
            web_app_url: Url::parse("https://app.example.com").unwrap(),
        },
    ));
    let opened = Arc::new(Mutex::new(Vec::new()));
    let refuse = Arc::new(AtomicBool::new(false));
    let opener = Opener {
        opened: Arc::clone(&opened),
        refuse: Arc::clone(&refuse),
    };
    let ctx = BridgeContext::new(session, bus, Arc::new(opener), BridgeSettings::default());
    (ctx, opened, refuse)
}

pub(crate) fn harness() -> Harness {
    let (ctx, opened, refuse) = context();
    let (host, webview) = DuplexChannel::new();
    let (outbound, _) = host.split();
    let (_, inbound) = webview.split();
    Harness {
        ctx,
        outbound,
        inbound,
        context_override: Map::new(),
        opened,
        refuse,
    }
}
