//! Shared state injected into every view.

use std::sync::Arc;

use viewbridge_agent::{AgentConnector, ProcessLauncher};
use viewbridge_config::{BridgeConfig, BridgeSection, ConfigStore};
use viewbridge_events::EventBus;
use viewbridge_session::{BackendConnector, Environment, SessionManager};

use crate::environment::{EditorContextSource, UrlOpener};
use crate::error::BridgeResult;

/// Per-bridge settings that views read but never change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeSettings {
    /// Method namespace proxied to the backend.
    pub backend_namespace: String,
    /// Name returned by view serialization.
    pub deserializer: String,
}

impl BridgeSettings {
    /// Read from the `[bridge]` config section.
    #[must_use]
    pub fn from_section(section: &BridgeSection) -> Self {
        Self {
            backend_namespace: section.backend_namespace.clone(),
            deserializer: section.deserializer.clone(),
        }
    }
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self::from_section(&BridgeSection::default())
    }
}

/// Session, config, event bus and environment shared by all views.
///
/// Cheap to clone.
#[derive(Clone)]
pub struct BridgeContext {
    session: Arc<SessionManager>,
    bus: EventBus,
    url_opener: Arc<dyn UrlOpener>,
    editor: Option<Arc<dyn EditorContextSource>>,
    settings: BridgeSettings,
}

impl std::fmt::Debug for BridgeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeContext")
            .field("session", &self.session)
            .field("settings", &self.settings)
            .field("editor", &self.editor.is_some())
            .finish_non_exhaustive()
    }
}

impl BridgeContext {
    /// Assemble a context from existing parts.
    ///
    /// `bus` must be the bus the session and its config store publish on.
    #[must_use]
    pub fn new(
        session: Arc<SessionManager>,
        bus: EventBus,
        url_opener: Arc<dyn UrlOpener>,
        settings: BridgeSettings,
    ) -> Self {
        Self {
            session,
            bus,
            url_opener,
            editor: None,
            settings,
        }
    }

    /// Build the whole host side from configuration with the given backend.
    ///
    /// Starts the session's backend watcher, so this must run inside a
    /// Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the web app URL or an initial webview value is
    /// invalid.
    pub fn from_config(
        config: &BridgeConfig,
        connector: Arc<dyn BackendConnector>,
        url_opener: Arc<dyn UrlOpener>,
    ) -> BridgeResult<Self> {
        let bus = EventBus::with_capacity(config.bridge.channel_capacity);
        Self::from_parts(config, bus, connector, url_opener)
    }

    /// Build the whole host side from configuration with the agent backend
    /// described by `[agent]`.
    ///
    /// # Errors
    ///
    /// Returns an error if no agent path is configured, or for the reasons
    /// listed on [`from_config`](Self::from_config).
    pub fn with_agent(config: &BridgeConfig, url_opener: Arc<dyn UrlOpener>) -> BridgeResult<Self> {
        let bus = EventBus::with_capacity(config.bridge.channel_capacity);
        let launcher = ProcessLauncher::from_config(&config.agent)?;
        let connector = AgentConnector::new(Arc::new(launcher), bus.clone());
        Self::from_parts(config, bus, Arc::new(connector), url_opener)
    }

    /// Build the host side on an existing bus.
    ///
    /// Use this when the connector publishes backend events itself and so
    /// must share the bus the views subscribe to.
    ///
    /// # Errors
    ///
    /// See [`from_config`](Self::from_config).
    pub fn from_parts(
        config: &BridgeConfig,
        bus: EventBus,
        connector: Arc<dyn BackendConnector>,
        url_opener: Arc<dyn UrlOpener>,
    ) -> BridgeResult<Self> {
        let store = Arc::new(ConfigStore::from_config(config, bus.clone())?);
        let environment = Environment {
            web_app_url: config.web_app_url()?,
        };
        let session = Arc::new(SessionManager::new(
            connector,
            store,
            bus.clone(),
            environment,
        ));
        // Exits on its own once the session is dropped.
        drop(session.spawn_backend_watcher());

        Ok(Self::new(
            session,
            bus,
            url_opener,
            BridgeSettings::from_section(&config.bridge),
        ))
    }

    /// Forward active-editor changes to views after they become ready.
    #[must_use]
    pub fn with_editor_source(mut self, source: Arc<dyn EditorContextSource>) -> Self {
        self.editor = Some(source);
        self
    }

    /// The shared session.
    #[must_use]
    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// The shared option store.
    #[must_use]
    pub fn config(&self) -> &Arc<ConfigStore> {
        self.session.config()
    }

    /// The host event bus.
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// External URL opener.
    #[must_use]
    pub fn url_opener(&self) -> &Arc<dyn UrlOpener> {
        &self.url_opener
    }

    /// Active-editor source, when one is injected.
    #[must_use]
    pub fn editor_source(&self) -> Option<&Arc<dyn EditorContextSource>> {
        self.editor.as_ref()
    }

    /// Bridge settings.
    #[must_use]
    pub fn settings(&self) -> &BridgeSettings {
        &self.settings
    }
}
