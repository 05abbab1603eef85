//! Runtime store for webview-visible configuration options.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use serde_json::{Map, Value};
use tracing::{debug, info};
use viewbridge_events::{EventBus, EventMetadata, HostEvent};

use crate::error::ConfigResult;
use crate::options::{self, OptionEffect};
use crate::types::BridgeConfig;

/// Option store shared by every view.
///
/// All writes go through [`ConfigStore::set`], which publishes exactly one
/// [`HostEvent::ConfigChanged`] per successful write. The publish happens
/// under the store lock, so subscribers observe changes in write order.
#[derive(Debug)]
pub struct ConfigStore {
    values: Mutex<BTreeMap<String, Value>>,
    bus: EventBus,
}

impl ConfigStore {
    /// Create an empty store publishing on `bus`.
    #[must_use]
    pub fn new(bus: EventBus) -> Self {
        Self {
            values: Mutex::new(BTreeMap::new()),
            bus,
        }
    }

    /// Create a store seeded from the `[webview]` section of `config`.
    ///
    /// Seeding does not publish events.
    ///
    /// # Errors
    ///
    /// Returns an error if any initial value names an unknown option or has
    /// the wrong type.
    pub fn from_config(config: &BridgeConfig, bus: EventBus) -> ConfigResult<Self> {
        let mut values = BTreeMap::new();
        for (name, value) in &config.webview {
            options::lookup(name)?.check(value)?;
            values.insert(name.clone(), value.clone());
        }
        debug!(count = values.len(), "seeded config store");
        Ok(Self {
            values: Mutex::new(values),
            bus,
        })
    }

    /// Write one option and publish the change.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownOption`](crate::ConfigError::UnknownOption)
    /// or [`ConfigError::InvalidValue`](crate::ConfigError::InvalidValue);
    /// nothing is stored or published in either case.
    pub fn set(&self, name: &str, value: Value) -> ConfigResult<()> {
        let spec = options::lookup(name)?;
        spec.check(&value)?;

        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(name.to_owned(), value.clone());

        let mut changes = Map::new();
        changes.insert(name.to_owned(), value);
        self.bus.publish(HostEvent::ConfigChanged {
            metadata: EventMetadata::new("config_store"),
            changes,
            webview_visible: spec.effect == OptionEffect::Webview,
        });
        drop(values);

        info!(option = name, "configuration option updated");
        Ok(())
    }

    /// Read one option.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// All stored options.
    #[must_use]
    pub fn snapshot(&self) -> Map<String, Value> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Stored options whose changes are visible to webviews.
    #[must_use]
    pub fn webview_snapshot(&self) -> Map<String, Value> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(name, _)| {
                options::lookup(name).is_ok_and(|spec| spec.effect == OptionEffect::Webview)
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
