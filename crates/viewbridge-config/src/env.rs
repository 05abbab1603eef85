//! Environment variable fallbacks.
//!
//! Env vars are a fallback, not an override: they only fill fields that no
//! config file set.

use std::collections::HashMap;

use tracing::debug;

use crate::merge::{ConfigLayer, FieldSources};

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
}

/// All supported `VIEWBRIDGE_*` env var mappings.
const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "VIEWBRIDGE_WEB_APP_URL",
        field_path: "environment.web_app_url",
    },
    EnvMapping {
        var_name: "VIEWBRIDGE_LOG_LEVEL",
        field_path: "logging.level",
    },
    EnvMapping {
        var_name: "VIEWBRIDGE_AGENT_PATH",
        field_path: "agent.path",
    },
    EnvMapping {
        var_name: "VIEWBRIDGE_REQUEST_TIMEOUT_SECS",
        field_path: "bridge.request_timeout_secs",
    },
];

/// Apply environment variable fallbacks to fields that no config file set.
///
/// Fields still carrying their compiled-in default count as unset.
/// Returns the number of env vars applied.
pub fn apply_env_fallbacks<S: ::std::hash::BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> usize {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        let set_by_file = sources
            .get(mapping.field_path)
            .is_some_and(|layer| *layer != ConfigLayer::Defaults);
        if set_by_file {
            continue;
        }

        if let Some(val) = env_vars.get(mapping.var_name) {
            debug!(
                var = mapping.var_name,
                field = mapping.field_path,
                "applying env var fallback"
            );
            set_field_from_string(merged, mapping.field_path, val);
            sources.insert(mapping.field_path.to_owned(), ConfigLayer::Environment);
            count = count.saturating_add(1);
        }
    }

    count
}

/// Set a dotted field in the TOML tree, creating intermediate tables.
fn set_field_from_string(root: &mut toml::Value, path: &str, val: &str) {
    let toml_val = coerce_to_toml_value(path, val);
    let Some((parents, leaf)) = path.rsplit_once('.') else {
        if let Some(table) = root.as_table_mut() {
            table.insert(path.to_owned(), toml_val);
        }
        return;
    };

    let mut current = root;
    for segment in parents.split('.') {
        let Some(table) = current.as_table_mut() else {
            return;
        };
        current = table
            .entry(segment.to_owned())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }

    if let Some(table) = current.as_table_mut() {
        table.insert(leaf.to_owned(), toml_val);
    }
}

/// Coerce a string env var value to the TOML type of its field.
fn coerce_to_toml_value(path: &str, val: &str) -> toml::Value {
    if path == "bridge.request_timeout_secs"
        && let Ok(i) = val.parse::<i64>()
    {
        return toml::Value::Integer(i);
    }
    toml::Value::String(val.to_owned())
}

/// Collect all current environment variables into a map.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_env_fills_default_fields() {
        let mut merged: toml::Value = toml::from_str("[logging]\nlevel = \"info\"\n").unwrap();
        let mut sources = FieldSources::new();
        sources.insert("logging.level".to_owned(), ConfigLayer::Defaults);

        let env = make_env(&[("VIEWBRIDGE_LOG_LEVEL", "debug")]);
        let count = apply_env_fallbacks(&mut merged, &mut sources, &env);

        assert_eq!(count, 1);
        assert_eq!(merged["logging"]["level"].as_str(), Some("debug"));
        assert_eq!(sources.get("logging.level"), Some(&ConfigLayer::Environment));
    }

    #[test]
    fn test_env_does_not_override_file_value() {
        let mut merged: toml::Value = toml::from_str("[logging]\nlevel = \"warn\"\n").unwrap();
        let mut sources = FieldSources::new();
        sources.insert("logging.level".to_owned(), ConfigLayer::User);

        let env = make_env(&[("VIEWBRIDGE_LOG_LEVEL", "debug")]);
        assert_eq!(apply_env_fallbacks(&mut merged, &mut sources, &env), 0);
        assert_eq!(merged["logging"]["level"].as_str(), Some("warn"));
    }

    #[test]
    fn test_env_creates_missing_tables_and_coerces_integers() {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        let mut sources = FieldSources::new();
        let env = make_env(&[
            ("VIEWBRIDGE_REQUEST_TIMEOUT_SECS", "12"),
            ("VIEWBRIDGE_AGENT_PATH", "/opt/agent"),
        ]);

        assert_eq!(apply_env_fallbacks(&mut merged, &mut sources, &env), 2);
        assert_eq!(merged["bridge"]["request_timeout_secs"].as_integer(), Some(12));
        assert_eq!(merged["agent"]["path"].as_str(), Some("/opt/agent"));
    }

    #[test]
    fn test_unparseable_integer_stays_string() {
        assert_eq!(
            coerce_to_toml_value("bridge.request_timeout_secs", "soon"),
            toml::Value::String("soon".to_owned())
        );
    }
}
