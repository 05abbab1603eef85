//! Bootstrap snapshot handed to a webview on load and after sign-in.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identity part of the bootstrap snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    /// Signed-in user.
    pub user_id: String,
    /// Current team, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
}

/// Host environment part of the bootstrap snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentInfo {
    /// Web application base URL.
    pub web_app_url: String,
}

/// Snapshot assembled per `bootstrap` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapData {
    /// Who is signed in.
    pub session: SessionInfo,
    /// Host environment accessors.
    pub environment: EnvironmentInfo,
    /// Webview-visible configuration options.
    pub configs: Map<String, Value>,
    /// UI context. The host merges the view's context override into it.
    pub context: Map<String, Value>,
    /// Bridge version.
    pub version: String,
    /// Backend-provided state, flattened.
    #[serde(flatten)]
    pub state: Map<String, Value>,
}

impl BootstrapData {
    /// Shallow-merge `overlay` into `context`, overlay keys winning.
    pub fn merge_context(&mut self, overlay: &Map<String, Value>) {
        for (key, value) in overlay {
            self.context.insert(key.clone(), value.clone());
        }
    }
}
