//! Serializable gate configuration
//!
//! A [`DispatchConfig`] describes the dispatcher's own gate and, by name, the
//! gates of its children. It is usually loaded from JSON at startup and
//! applied with [`Dispatcher::apply_config`](crate::Dispatcher::apply_config).
//!
//! ```
//! use log_dispatch::{DispatchConfig, EventType, Filter};
//!
//! let config = DispatchConfig::from_json_str(r#"{
//!     "dispatcher": { "filter": { "kind": "always_pass" } },
//!     "loggers": {
//!         "console": { "enabled": false },
//!         "audit": { "filter": { "kind": "any_mask", "args": ["Error", "Critical"] } }
//!     }
//! }"#).unwrap();
//!
//! assert!(!config.loggers["console"].enabled);
//! assert_eq!(
//!     config.loggers["audit"].filter,
//!     Filter::any_mask([EventType::ERROR, EventType::CRITICAL])
//! );
//! ```

use crate::core::{DispatchError, Filter, Logger, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

fn default_enabled() -> bool {
    true
}

/// Enabled flag and filter for one logger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub filter: Filter,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            filter: Filter::AlwaysPass,
        }
    }
}

impl GateSettings {
    pub fn new(enabled: bool, filter: Filter) -> Self {
        Self { enabled, filter }
    }

    /// Overwrite the gate of `logger` with these settings
    pub fn apply_to(&self, logger: &dyn Logger) {
        logger.set_enabled(self.enabled);
        logger.set_filter(self.filter.clone());
    }

    /// Current settings of `logger`
    pub fn capture(logger: &dyn Logger) -> Self {
        Self {
            enabled: logger.is_enabled(),
            filter: logger.filter(),
        }
    }
}

/// Gate settings for a dispatcher and its children
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    #[serde(default)]
    pub dispatcher: GateSettings,
    /// Child settings keyed by logger name or contract name
    #[serde(default)]
    pub loggers: BTreeMap<String, GateSettings>,
}

impl DispatchConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DispatchError::io_operation(
                "reading dispatch configuration",
                path.display().to_string(),
                e,
            )
        })?;
        Self::from_json_str(&raw)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[must_use]
    pub fn with_logger(mut self, name: impl Into<String>, settings: GateSettings) -> Self {
        self.loggers.insert(name.into(), settings);
        self
    }
}
