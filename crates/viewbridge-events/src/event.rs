//! Host event types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Metadata attached to every host event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// When the event was created.
    pub timestamp: DateTime<Utc>,
    /// Correlation ID for tracing related events.
    pub correlation_id: Option<Uuid>,
    /// Source component that generated the event.
    pub source: String,
}

impl EventMetadata {
    /// Create new event metadata.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            correlation_id: None,
            source: source.into(),
        }
    }

    /// Set correlation ID.
    #[must_use]
    pub fn with_correlation_id(mut self, id: Uuid) -> Self {
        self.correlation_id = Some(id);
        self
    }
}

impl Default for EventMetadata {
    fn default() -> Self {
        Self::new("unknown")
    }
}

/// Authentication status of the host session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    /// No authenticated backend connection.
    #[default]
    SignedOut,
    /// A login attempt is in flight.
    SigningIn,
    /// An authenticated backend connection is established.
    SignedIn,
}

impl SessionStatus {
    /// Wire name of the status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SignedOut => "signedOut",
            Self::SigningIn => "signingIn",
            Self::SignedIn => "signedIn",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a session transitioned to [`SessionStatus::SignedOut`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LogoutReason {
    /// The user asked to sign out.
    User,
    /// The backend reported the access token as expired or revoked.
    Token,
    /// The backend refused this client version.
    UnsupportedVersion,
    /// Any other reason.
    #[default]
    Unknown,
}

/// All events raised by host-side sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    /// The backend reported that some of its data changed.
    BackendDataChanged {
        /// Event metadata.
        metadata: EventMetadata,
        /// Opaque payload, forwarded to webviews untouched.
        payload: Value,
    },
    /// The backend connection status changed.
    BackendConnectionStatusChanged {
        /// Event metadata.
        metadata: EventMetadata,
        /// Opaque payload, forwarded to webviews untouched.
        payload: Value,
    },
    /// The backend re-evaluated client version compatibility.
    BackendVersionCompatibilityChanged {
        /// Event metadata.
        metadata: EventMetadata,
        /// Opaque payload, forwarded to webviews untouched.
        payload: Value,
    },
    /// Code markers of an open document changed.
    BackendDocumentMarkersChanged {
        /// Event metadata.
        metadata: EventMetadata,
        /// Opaque payload, forwarded to webviews untouched.
        payload: Value,
    },
    /// The backend dropped the authenticated session on its own.
    BackendDidLogout {
        /// Event metadata.
        metadata: EventMetadata,
        /// Reason reported by the backend.
        reason: LogoutReason,
    },
    /// The session state machine moved to a new status.
    SessionStatusChanged {
        /// Event metadata.
        metadata: EventMetadata,
        /// Status before the transition.
        previous: SessionStatus,
        /// Status after the transition.
        status: SessionStatus,
        /// Set when `status` is `SignedOut` because of a logout.
        reason: Option<LogoutReason>,
    },
    /// A configuration option was written.
    ConfigChanged {
        /// Event metadata.
        metadata: EventMetadata,
        /// Changed option names mapped to their new values.
        changes: Map<String, Value>,
        /// Whether the change is visible to webviews.
        webview_visible: bool,
    },
}

impl HostEvent {
    /// Get the event type as a string.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::BackendDataChanged { .. } => "backend_data_changed",
            Self::BackendConnectionStatusChanged { .. } => "backend_connection_status_changed",
            Self::BackendVersionCompatibilityChanged { .. } => {
                "backend_version_compatibility_changed"
            },
            Self::BackendDocumentMarkersChanged { .. } => "backend_document_markers_changed",
            Self::BackendDidLogout { .. } => "backend_did_logout",
            Self::SessionStatusChanged { .. } => "session_status_changed",
            Self::ConfigChanged { .. } => "config_changed",
        }
    }

    /// Get the event metadata.
    #[must_use]
    pub fn metadata(&self) -> &EventMetadata {
        match self {
            Self::BackendDataChanged { metadata, .. }
            | Self::BackendConnectionStatusChanged { metadata, .. }
            | Self::BackendVersionCompatibilityChanged { metadata, .. }
            | Self::BackendDocumentMarkersChanged { metadata, .. }
            | Self::BackendDidLogout { metadata, .. }
            | Self::SessionStatusChanged { metadata, .. }
            | Self::ConfigChanged { metadata, .. } => metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_defaults() {
        let meta = EventMetadata::new("session");
        assert_eq!(meta.source, "session");
        assert!(meta.correlation_id.is_none());

        let id = Uuid::new_v4();
        let meta = meta.with_correlation_id(id);
        assert_eq!(meta.correlation_id, Some(id));
    }

    #[test]
    fn test_session_status_wire_names() {
        assert_eq!(
            serde_json::to_value(SessionStatus::SignedOut).unwrap(),
            serde_json::json!("signedOut")
        );
        assert_eq!(SessionStatus::SigningIn.to_string(), "signingIn");
        assert_eq!(SessionStatus::default(), SessionStatus::SignedOut);
    }

    #[test]
    fn test_logout_reason_wire_names() {
        assert_eq!(
            serde_json::to_value(LogoutReason::UnsupportedVersion).unwrap(),
            serde_json::json!("unsupportedVersion")
        );
        let reason: LogoutReason = serde_json::from_value(serde_json::json!("token")).unwrap();
        assert_eq!(reason, LogoutReason::Token);
    }

    #[test]
    fn test_event_type_and_metadata() {
        let event = HostEvent::ConfigChanged {
            metadata: EventMetadata::new("config"),
            changes: Map::new(),
            webview_visible: true,
        };
        assert_eq!(event.event_type(), "config_changed");
        assert_eq!(event.metadata().source, "config");
    }
}
