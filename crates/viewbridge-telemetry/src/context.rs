//! Request context for correlation and tracing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Context carried through the handling of one webview request.
///
/// The envelope id is chosen by the webview and is only unique per channel,
/// so every context also gets a host-generated `request_id`, and the owning
/// view id when there is one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// Host-generated request identifier.
    pub request_id: Uuid,
    /// Correlation ID for tracing related requests.
    pub correlation_id: Uuid,
    /// Parent request ID if this is a sub-request.
    pub parent_id: Option<Uuid>,
    /// View that received the request.
    pub view_id: Option<Uuid>,
    /// Envelope id assigned by the webview.
    pub envelope_id: Option<String>,
    /// Method being handled.
    pub method: Option<String>,
    /// When the request started.
    pub started_at: DateTime<Utc>,
    /// Source component that created this context.
    pub source: String,
}

impl RequestContext {
    /// Create a new request context.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        let id = Uuid::new_v4();
        Self {
            request_id: id,
            correlation_id: id,
            parent_id: None,
            view_id: None,
            envelope_id: None,
            method: None,
            started_at: Utc::now(),
            source: source.into(),
        }
    }

    /// Create a child context that inherits correlation info.
    #[must_use]
    pub fn child(&self, source: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            correlation_id: self.correlation_id,
            parent_id: Some(self.request_id),
            view_id: self.view_id,
            envelope_id: self.envelope_id.clone(),
            method: self.method.clone(),
            started_at: Utc::now(),
            source: source.into(),
        }
    }

    /// Set the owning view.
    #[must_use]
    pub fn with_view_id(mut self, id: Uuid) -> Self {
        self.view_id = Some(id);
        self
    }

    /// Set the envelope id.
    #[must_use]
    pub fn with_envelope_id(mut self, id: impl Into<String>) -> Self {
        self.envelope_id = Some(id.into());
        self
    }

    /// Set the method name.
    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Get elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> i64 {
        Utc::now()
            .signed_duration_since(self.started_at)
            .num_milliseconds()
    }

    /// Create a tracing span with this context.
    #[must_use]
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "request",
            request_id = %self.request_id,
            correlation_id = %self.correlation_id,
            source = %self.source,
            view_id = ?self.view_id,
            id = self.envelope_id.as_deref(),
            method = self.method.as_deref(),
        )
    }

    /// Get a short identifier for logging.
    #[must_use]
    pub fn short_id(&self) -> String {
        self.request_id.simple().to_string().chars().take(8).collect()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new("unknown")
    }
}

/// Guard that logs when a request completes.
///
/// Not `Send`: hold it only around synchronous work. Async handlers use
/// `tracing::Instrument` with [`RequestContext::span`] instead.
pub struct RequestGuard {
    context: RequestContext,
    _span: tracing::span::EnteredSpan,
}

impl RequestGuard {
    /// Create a new request guard.
    #[must_use]
    pub fn new(context: RequestContext) -> Self {
        let span = context.span().entered();
        tracing::debug!("Request started");
        Self {
            context,
            _span: span,
        }
    }

    /// Get the request context.
    #[must_use]
    pub fn context(&self) -> &RequestContext {
        &self.context
    }
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        tracing::debug!(elapsed_ms = self.context.elapsed_ms(), "Request completed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_context_creation() {
        let ctx = RequestContext::new("request_router");
        assert_eq!(ctx.source, "request_router");
        assert_eq!(ctx.request_id, ctx.correlation_id);
        assert!(ctx.parent_id.is_none());
        assert!(ctx.view_id.is_none());
        assert!(ctx.method.is_none());
    }

    #[test]
    fn test_request_context_builder() {
        let view = Uuid::new_v4();
        let ctx = RequestContext::new("request_router")
            .with_view_id(view)
            .with_envelope_id("42")
            .with_method("codeStream/posts");

        assert_eq!(ctx.view_id, Some(view));
        assert_eq!(ctx.envelope_id.as_deref(), Some("42"));
        assert_eq!(ctx.method.as_deref(), Some("codeStream/posts"));
    }

    #[test]
    fn test_child_context() {
        let parent = RequestContext::new("request_router")
            .with_view_id(Uuid::new_v4())
            .with_envelope_id("7");

        let child = parent.child("backend_proxy");

        assert_ne!(child.request_id, parent.request_id);
        assert_eq!(child.correlation_id, parent.correlation_id);
        assert_eq!(child.parent_id, Some(parent.request_id));
        assert_eq!(child.view_id, parent.view_id);
        assert_eq!(child.envelope_id.as_deref(), Some("7"));
        assert_eq!(child.source, "backend_proxy");
    }

    #[test]
    fn test_elapsed() {
        let ctx = RequestContext::new("test");
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert!(ctx.elapsed_ms() >= 10);
    }

    #[test]
    fn test_short_id() {
        assert_eq!(RequestContext::new("test").short_id().len(), 8);
    }

    #[test]
    fn test_guard_exposes_context() {
        let guard = RequestGuard::new(RequestContext::new("test").with_method("bootstrap"));
        assert_eq!(guard.context().method.as_deref(), Some("bootstrap"));
    }

    #[test]
    fn test_serialization() {
        let ctx = RequestContext::new("test").with_method("login");

        let json = serde_json::to_string(&ctx).unwrap();
        assert!(json.contains("\"source\":\"test\""));
        assert!(json.contains("\"method\":\"login\""));

        let parsed: RequestContext = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.method.as_deref(), Some("login"));
    }
}
