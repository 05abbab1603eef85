//! UI context mirrored from the webview.

use std::sync::{Arc, PoisonError, RwLock};

use serde_json::{Map, Value};

/// The webview's last reported context.
///
/// Seeded from the override supplied at view construction and replaced
/// wholesale by `webview/didChangeContext`. The host never edits it.
#[derive(Debug, Clone, Default)]
pub struct ViewContext {
    inner: Arc<RwLock<Map<String, Value>>>,
}

impl ViewContext {
    /// Context seeded with `initial`.
    #[must_use]
    pub fn new(initial: Map<String, Value>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    /// Copy of the current context.
    #[must_use]
    pub fn snapshot(&self) -> Map<String, Value> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the whole context.
    pub fn replace(&self, context: Map<String, Value>) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = context;
    }
}
