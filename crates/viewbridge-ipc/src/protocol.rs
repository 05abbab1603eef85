//! Method names and typed params shared by host and webview.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Local host commands.
pub mod commands {
    /// Assemble the bootstrap snapshot.
    pub const BOOTSTRAP: &str = "bootstrap";
    /// Open the external Slack sign-in flow.
    pub const SLACK_LOGIN: &str = "slack-login";
    /// Redeem the pending signup token.
    pub const COMPLETE_SIGNUP: &str = "complete-signup";
    /// Credential login.
    pub const LOGIN: &str = "login";
    /// Write one configuration option.
    pub const UPDATE_CONFIGURATION: &str = "update-configuration";
}

/// Host → webview notifications.
pub mod host {
    /// Opaque backend data change.
    pub const DID_CHANGE_DATA: &str = "codestream/didChangeData";
    /// Backend connection status change.
    pub const DID_CHANGE_CONNECTION_STATUS: &str = "codestream/didChangeConnectionStatus";
    /// Backend version compatibility change.
    pub const DID_CHANGE_VERSION_COMPATIBILITY: &str = "codestream/didChangeVersionCompatibility";
    /// Code markers of an open document changed.
    pub const DID_CHANGE_DOCUMENT_MARKERS: &str = "codestream/didChangeDocumentMarkers";
    /// The session signed out.
    pub const DID_LOGOUT: &str = "host/didLogout";
    /// Webview-visible configuration changed.
    pub const DID_CHANGE_CONFIG: &str = "host/didChangeConfig";
    /// Focus a stream or thread.
    pub const SHOW_STREAM: &str = "host/showStream";
    /// The active editor changed.
    pub const DID_CHANGE_ACTIVE_EDITOR: &str = "host/didChangeActiveEditor";
}

/// Webview → host notifications.
pub mod webview {
    /// The webview finished loading and can receive notifications.
    pub const DID_INITIALIZE: &str = "webview/didInitialize";
    /// The webview's UI context changed.
    pub const DID_CHANGE_CONTEXT: &str = "webview/didChangeContext";
}

/// Params of the `login` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Params of the `update-configuration` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateConfigurationRequest {
    /// Option name.
    pub name: String,
    /// New value.
    pub value: Value,
}

/// Params of `host/showStream`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowStreamNotification {
    /// Stream to show.
    pub stream_id: Option<String>,
    /// Thread within the stream.
    pub thread_id: Option<String>,
}

/// Params of `webview/didChangeContext`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DidChangeContextNotification {
    /// The full replacement context.
    pub context: Value,
}
