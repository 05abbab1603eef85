//! Test fixtures for common types.

use serde_json::{Map, Value, json};
use viewbridge_config::BridgeConfig;
use viewbridge_session::LoginState;

/// Email accepted by a default [`MockConnector`](crate::MockConnector).
pub const TEST_EMAIL: &str = "dev@example.com";
/// Password accepted by a default [`MockConnector`](crate::MockConnector).
pub const TEST_PASSWORD: &str = "secret";
/// Signup token accepted by a default [`MockConnector`](crate::MockConnector).
pub const TEST_SIGNUP_TOKEN: &str = "signup-token-1";
/// Web app URL of [`test_config`].
pub const TEST_WEB_APP_URL: &str = "https://app.example.com";

/// Configuration pointing at [`TEST_WEB_APP_URL`] with a few webview
/// options seeded.
#[must_use]
pub fn test_config() -> BridgeConfig {
    let mut config = BridgeConfig::default();
    config.environment.web_app_url = TEST_WEB_APP_URL.to_owned();
    config
        .webview
        .insert("showHeadshots".to_owned(), Value::Bool(true));
    config.webview.insert("muteAll".to_owned(), Value::Bool(false));
    config
}

/// Login state reported by a default [`MockConnector`](crate::MockConnector).
#[must_use]
pub fn test_login_state() -> LoginState {
    let mut extra = Map::new();
    extra.insert("capabilities".to_owned(), json!({"channelMute": true}));
    LoginState {
        user_id: "user-1".to_owned(),
        team_id: Some("team-1".to_owned()),
        extra,
    }
}

/// `login` params with valid credentials.
#[must_use]
pub fn valid_login_params() -> Value {
    json!({"email": TEST_EMAIL, "password": TEST_PASSWORD})
}

/// `login` params with a wrong password.
#[must_use]
pub fn invalid_login_params() -> Value {
    json!({"email": TEST_EMAIL, "password": "not-the-password"})
}

/// A JSON object as a map.
///
/// # Panics
///
/// Panics if `value` is not an object.
#[must_use]
pub fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}
