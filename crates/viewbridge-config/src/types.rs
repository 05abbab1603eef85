//! Configuration types for the viewbridge host.
//!
//! Every struct implements [`Default`] so that a bare `[section]` header in
//! TOML produces a working configuration.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration for the viewbridge host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Host environment accessors exposed to the session.
    pub environment: EnvironmentSection,
    /// Routing and channel settings.
    pub bridge: BridgeSection,
    /// Backend agent process settings.
    pub agent: AgentSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
    /// Initial values of the webview options, keyed by option name.
    pub webview: BTreeMap<String, Value>,
}

// ---------------------------------------------------------------------------
// EnvironmentSection
// ---------------------------------------------------------------------------

/// Host environment the session runs against.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentSection {
    /// Base URL of the web application (used for browser sign-in flows).
    pub web_app_url: String,
}

impl Default for EnvironmentSection {
    fn default() -> Self {
        Self {
            web_app_url: "https://app.codestream.com".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// BridgeSection
// ---------------------------------------------------------------------------

/// Routing and channel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSection {
    /// Method namespace proxied verbatim to the backend.
    pub backend_namespace: String,
    /// Request-side timeout applied by the webview client.
    pub request_timeout_secs: u64,
    /// Capacity of the host event bus.
    pub channel_capacity: usize,
    /// Deserializer name returned by view serialization.
    pub deserializer: String,
}

impl Default for BridgeSection {
    fn default() -> Self {
        Self {
            backend_namespace: "codeStream".to_owned(),
            request_timeout_secs: 30,
            channel_capacity: 1024,
            deserializer: "viewbridge/WebviewView".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// AgentSection
// ---------------------------------------------------------------------------

/// Backend agent process settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSection {
    /// Path to the agent executable. `None` means no agent is spawned.
    pub path: Option<PathBuf>,
    /// Arguments passed to the agent.
    pub args: Vec<String>,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            path: None,
            args: vec!["--stdio".to_owned()],
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Level filter (`trace`, `debug`, `info`, `warn`, `error`).
    pub level: String,
    /// Output format (`pretty`, `compact`, `json`, `full`).
    pub format: String,
    /// Directory for rolling log files. Logs go to stderr when unset.
    pub directory: Option<PathBuf>,
    /// Extra `tracing` directives such as `viewbridge_agent=trace`.
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "pretty".to_owned(),
            directory: None,
            directives: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_sections_use_defaults() {
        let config: BridgeConfig = toml::from_str("[bridge]\n[logging]\n").unwrap();
        assert_eq!(config.bridge.backend_namespace, "codeStream");
        assert_eq!(config.bridge.request_timeout_secs, 30);
        assert_eq!(config.logging.level, "info");
        assert!(config.agent.path.is_none());
        assert!(config.webview.is_empty());
    }

    #[test]
    fn test_webview_values_keep_json_types() {
        let config: BridgeConfig =
            toml::from_str("[webview]\nmuteAll = true\ntraceLevel = \"debug\"\n").unwrap();
        assert_eq!(config.webview.get("muteAll"), Some(&Value::Bool(true)));
        assert_eq!(
            config.webview.get("traceLevel"),
            Some(&Value::String("debug".to_owned()))
        );
    }
}
