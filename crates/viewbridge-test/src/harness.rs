//! Test harness helpers.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;
use viewbridge_config::BridgeConfig;
use viewbridge_host::{BridgeContext, EditorContextSource, WebviewView};
use viewbridge_ipc::WebviewClient;

use crate::fixtures::{test_config, valid_login_params};
use crate::mocks::{CapturingSurfaceFactory, MockBackend, MockConnector, MockUrlOpener};

/// Create a temporary directory for testing.
///
/// # Panics
///
/// Panics if the temporary directory cannot be created.
#[must_use]
pub fn test_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

/// Create a file within a temporary directory, creating parents as needed.
///
/// # Panics
///
/// Panics if the file cannot be created or written.
#[must_use]
pub fn test_file_in_dir(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent directories");
    }
    std::fs::write(&path, content).expect("Failed to write file");
    path
}

/// Set up test logging with the given filter.
pub fn setup_test_logging(filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_test_writer()
        .try_init();
}

/// Set up test logging with default filter (warn level).
pub fn setup_test_logging_default() {
    setup_test_logging("warn");
}

/// Host side wired to mocks.
///
/// Builds the shared [`BridgeContext`] from [`test_config`] with a
/// [`MockConnector`] handing out [`backend`](Self::backend).
pub struct BridgeHarness {
    /// Shared context given to every view.
    pub ctx: BridgeContext,
    /// Backend handed out on successful sign-in.
    pub backend: Arc<MockBackend>,
    /// Connector used by the session.
    pub connector: Arc<MockConnector>,
    /// Opener used for external sign-in.
    pub opener: Arc<MockUrlOpener>,
    /// Factory for every view opened through the harness.
    pub surfaces: CapturingSurfaceFactory,
}

impl BridgeHarness {
    /// Harness with default mocks and [`test_config`].
    ///
    /// # Panics
    ///
    /// Panics if the context cannot be built. Must run inside a Tokio
    /// runtime.
    #[must_use]
    pub fn new() -> Self {
        Self::with_parts(test_config(), MockConnector::new, MockUrlOpener::new())
    }

    /// Harness from explicit parts.
    ///
    /// # Panics
    ///
    /// Panics if the context cannot be built.
    #[must_use]
    pub fn with_parts(
        config: BridgeConfig,
        connector: impl FnOnce(Arc<MockBackend>) -> MockConnector,
        opener: MockUrlOpener,
    ) -> Self {
        setup_test_logging_default();
        let backend = Arc::new(MockBackend::new());
        let connector = Arc::new(connector(Arc::clone(&backend)));
        let opener = Arc::new(opener);
        let ctx = BridgeContext::from_config(&config, connector.clone(), opener.clone())
            .expect("Failed to build bridge context");
        Self {
            ctx,
            backend,
            connector,
            opener,
            surfaces: CapturingSurfaceFactory::new(Duration::from_secs(5)),
        }
    }

    /// Forward active-editor changes from `source` to views opened later.
    #[must_use]
    pub fn with_editor_source(mut self, source: Arc<dyn EditorContextSource>) -> Self {
        self.ctx = self.ctx.with_editor_source(source);
        self
    }

    /// Open a view and return it with the client bound to its surface.
    ///
    /// # Panics
    ///
    /// Panics if the view cannot be created.
    #[must_use]
    pub fn open_view(&self) -> (WebviewView, Arc<WebviewClient>) {
        self.open_view_with_context(None)
    }

    /// Open a view seeded with a UI context override.
    ///
    /// # Panics
    ///
    /// Panics if the view cannot be created.
    #[must_use]
    pub fn open_view_with_context(
        &self,
        context_override: Option<Map<String, Value>>,
    ) -> (WebviewView, Arc<WebviewClient>) {
        let view = WebviewView::new(self.ctx.clone(), &self.surfaces, context_override)
            .expect("Failed to open view");
        let client = self
            .surfaces
            .last_client()
            .expect("surface factory created no client");
        (view, client)
    }

    /// Valid `login` params.
    #[must_use]
    pub fn valid_login(&self) -> Value {
        valid_login_params()
    }
}

impl Default for BridgeHarness {
    fn default() -> Self {
        Self::new()
    }
}
