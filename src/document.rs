//! Persisted configuration document model.
//!
//! The document is a nested JSON structure: `global` defaults, per-host
//! overrides under `host_cfg`, and per-target overrides under each host's
//! `scripts` table. Entries are created on demand and never deleted
//! automatically; `global` always exists, even when empty.

use std::collections::BTreeMap;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Token separating the path and module name in a composite target key.
///
/// Module names cannot contain `::`, so a composite key never collides with
/// another composite key. Plain keys are absolute file paths and are kept
/// verbatim.
pub const MODULE_KEY_SEPARATOR: &str = "::module::";

/// Identifies the configuration leaf for one runnable target.
///
/// Two invocations with the same path and the same module resolve to the
/// same key and therefore the same persisted overrides.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TargetKey {
    /// A script addressed by its local file path.
    Plain(Utf8PathBuf),
    /// A module run from a directory, addressed by directory plus name.
    WithModule {
        /// Directory the module is run from.
        dir: Utf8PathBuf,
        /// Module name passed to the interpreter.
        module: String,
    },
}

impl TargetKey {
    /// Renders the key used to index a host's `scripts` table.
    #[must_use]
    pub fn storage_key(&self) -> String {
        match self {
            Self::Plain(path) => path.as_str().to_owned(),
            Self::WithModule { dir, module } => {
                format!("{dir}{MODULE_KEY_SEPARATOR}{module}")
            }
        }
    }
}

/// Host-level configuration: arbitrary overrides plus per-target leaves.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct HostEntry {
    /// Per-target override tables, keyed by [`TargetKey::storage_key`].
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scripts: BTreeMap<String, Map<String, Value>>,
    /// Host-wide overrides applied to every target on this host.
    #[serde(flatten)]
    pub overrides: Map<String, Value>,
}

/// The entire persisted configuration.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Document {
    /// Global defaults applied before any host or target overrides.
    #[serde(default)]
    pub global: Map<String, Value>,
    /// Per-host configuration, keyed by host name.
    #[serde(default)]
    pub host_cfg: BTreeMap<String, HostEntry>,
    /// Most-recently-used host; last writer wins, no history retained.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mru_host: Option<String>,
}

impl Document {
    /// Returns the host entry, creating an empty one when absent.
    pub fn host_entry_mut(&mut self, host: &str) -> &mut HostEntry {
        self.host_cfg.entry(host.to_owned()).or_default()
    }

    /// Returns the target leaf under `host`, creating intermediate entries
    /// as needed so subsequent writes never fail on missing keys.
    pub fn target_leaf_mut(&mut self, host: &str, target: &TargetKey) -> &mut Map<String, Value> {
        self.host_entry_mut(host)
            .scripts
            .entry(target.storage_key())
            .or_default()
    }

    /// Returns the target leaf under `host` when both already exist.
    #[must_use]
    pub fn target_leaf(&self, host: &str, target: &TargetKey) -> Option<&Map<String, Value>> {
        self.host_cfg
            .get(host)
            .and_then(|entry| entry.scripts.get(&target.storage_key()))
    }

    /// Lists the hosts currently present in `host_cfg`.
    #[must_use]
    pub fn known_hosts(&self) -> Vec<String> {
        self.host_cfg.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests;
