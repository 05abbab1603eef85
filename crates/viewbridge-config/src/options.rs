//! The recognized webview option set.

use serde_json::Value;

use crate::error::{ConfigError, ConfigResult};

/// JSON type accepted by an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// `true` / `false`.
    Bool,
    /// Any JSON string.
    String,
}

impl OptionKind {
    /// Human-readable name used in error messages.
    #[must_use]
    pub fn expected(self) -> &'static str {
        match self {
            Self::Bool => "boolean",
            Self::String => "string",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Bool => value.is_boolean(),
            Self::String => value.is_string(),
        }
    }
}

/// Who consumes changes to an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionEffect {
    /// Re-broadcast to every webview.
    Webview,
    /// Consumed by the host only.
    Host,
}

/// A recognized option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionSpec {
    /// Option name as used on the wire.
    pub name: &'static str,
    /// Accepted value type.
    pub kind: OptionKind,
    /// Consumer of changes.
    pub effect: OptionEffect,
}

impl OptionSpec {
    const fn new(name: &'static str, kind: OptionKind, effect: OptionEffect) -> Self {
        Self { name, kind, effect }
    }

    /// Check that `value` has the type this option accepts.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] on a type mismatch.
    pub fn check(&self, value: &Value) -> ConfigResult<()> {
        if self.kind.accepts(value) {
            Ok(())
        } else {
            Err(ConfigError::InvalidValue {
                name: self.name.to_owned(),
                expected: self.kind.expected(),
            })
        }
    }
}

/// Every option accepted by the config store.
pub const RECOGNIZED_OPTIONS: &[OptionSpec] = &[
    OptionSpec::new("showHeadshots", OptionKind::Bool, OptionEffect::Webview),
    OptionSpec::new("showMarkers", OptionKind::Bool, OptionEffect::Webview),
    OptionSpec::new("muteAll", OptionKind::Bool, OptionEffect::Webview),
    OptionSpec::new("autoHideMarkers", OptionKind::Bool, OptionEffect::Webview),
    OptionSpec::new("openCommentOnSelect", OptionKind::Bool, OptionEffect::Webview),
    OptionSpec::new("debug", OptionKind::Bool, OptionEffect::Webview),
    OptionSpec::new("serverUrl", OptionKind::String, OptionEffect::Host),
    OptionSpec::new("email", OptionKind::String, OptionEffect::Host),
    OptionSpec::new("team", OptionKind::String, OptionEffect::Host),
    OptionSpec::new("traceLevel", OptionKind::String, OptionEffect::Host),
];

/// Look up an option by name.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownOption`] for names outside the set.
pub fn lookup(name: &str) -> ConfigResult<&'static OptionSpec> {
    RECOGNIZED_OPTIONS
        .iter()
        .find(|spec| spec.name == name)
        .ok_or_else(|| ConfigError::UnknownOption(name.to_owned()))
}
