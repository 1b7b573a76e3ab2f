// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Registry of bridges keyed by module identifier.

use dashmap::DashMap;
use tracing::debug;

use crate::bridge::{Bridge, ExportName};
use crate::config::BridgeConfig;

/// Maps module identifiers to their bridges.
///
/// Both sides of a cyclic import obtain the same bridge, whichever of them
/// asks first. Bridges are never evicted.
pub struct ModuleRegistry {
    bridges: DashMap<String, Bridge>,
    /// Template for bridges created by [`ModuleRegistry::prepare`]
    config: BridgeConfig,
}

impl ModuleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::with_config(BridgeConfig::default())
    }

    /// Create a registry whose bridges share `config` (the label is replaced
    /// by each module identifier).
    pub fn with_config(config: BridgeConfig) -> Self {
        Self {
            bridges: DashMap::new(),
            config,
        }
    }

    /// Get the bridge for `id`, creating it with `names` if absent
    pub fn prepare<I, N>(&self, id: &str, names: I) -> Bridge
    where
        I: IntoIterator<Item = N>,
        N: Into<ExportName>,
    {
        if let Some(existing) = self.bridges.get(id) {
            return existing.value().clone();
        }

        self.bridges
            .entry(id.to_string())
            .or_insert_with(|| {
                debug!(module = id, "Preparing bridge");
                let config = BridgeConfig {
                    label: Some(id.to_string()),
                    ..self.config.clone()
                };
                Bridge::with_config(names, config)
            })
            .value()
            .clone()
    }

    /// Get a registered bridge
    pub fn get(&self, id: &str) -> Option<Bridge> {
        self.bridges.get(id).map(|entry| entry.value().clone())
    }

    /// Check if a module is registered
    pub fn contains(&self, id: &str) -> bool {
        self.bridges.contains_key(id)
    }

    /// Get all registered module identifiers
    pub fn ids(&self) -> Vec<String> {
        self.bridges.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Get the number of registered modules
    pub fn len(&self) -> usize {
        self.bridges.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.bridges.is_empty()
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UnresolvedPolicy;

    #[test]
    fn test_prepare_returns_same_bridge() {
        let registry = ModuleRegistry::new();
        assert!(registry.is_empty());

        let first = registry.prepare("./a.js", ["x"]);
        let second = registry.prepare("./a.js", ["ignored"]);

        assert!(first.ptr_eq(&second));
        assert!(!second.namespace().is_declared("ignored"));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("./a.js"));
    }

    #[test]
    fn test_bridges_are_labelled() {
        let registry =
            ModuleRegistry::with_config(BridgeConfig::default().with_unresolved(UnresolvedPolicy::Strict));
        let bridge = registry.prepare("lib/util.js", Vec::<ExportName>::new());

        assert_eq!(bridge.label(), "lib/util.js");
        assert_eq!(bridge.config().unresolved, UnresolvedPolicy::Strict);
        assert!(registry.get("lib/util.js").is_some());
        assert!(registry.get("missing.js").is_none());
    }

    #[test]
    fn test_ids() {
        let registry = ModuleRegistry::default();
        registry.prepare("b", ["x"]);
        registry.prepare("a", ["y"]);

        let mut ids = registry.ids();
        ids.sort();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
