// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Bridge configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{BridgeError, Result};

/// Environment variable selecting the unresolved-binding policy.
pub const ENV_UNRESOLVED: &str = "EXIMPORT_UNRESOLVED";

/// Environment variable providing the default module label.
pub const ENV_LABEL: &str = "EXIMPORT_LABEL";

/// Label used when a bridge is not given one.
pub const ANONYMOUS_LABEL: &str = "<anonymous>";

/// What a read yields when the producer completed without settling the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnresolvedPolicy {
    /// Surface the missing binding as `undefined`
    #[default]
    Undefined,
    /// Report [`BridgeError::ExportNotFound`] from `resolve`
    Strict,
}

impl std::str::FromStr for UnresolvedPolicy {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "undefined" | "lenient" => Ok(Self::Undefined),
            "strict" => Ok(Self::Strict),
            other => Err(BridgeError::Config(format!(
                "unknown unresolved policy '{}'",
                other
            ))),
        }
    }
}

/// Configuration for a bridge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BridgeConfig {
    /// Module identifier used in logs and errors
    pub label: Option<String>,

    /// Policy for declared names the producer never settles
    pub unresolved: UnresolvedPolicy,
}

impl BridgeConfig {
    /// Configuration labelled with a module identifier.
    pub fn labelled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }

    /// Builder-style policy override.
    pub fn with_unresolved(mut self, policy: UnresolvedPolicy) -> Self {
        self.unresolved = policy;
        self
    }

    /// Parse configuration from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Default configuration with environment overrides applied.
    pub fn from_env() -> Result<Self> {
        Self::default().merge_env()
    }

    /// Apply `EXIMPORT_*` environment overrides.
    pub fn merge_env(mut self) -> Result<Self> {
        if let Ok(policy) = std::env::var(ENV_UNRESOLVED) {
            self.unresolved = policy.parse()?;
        }
        if let Ok(label) = std::env::var(ENV_LABEL) {
            if !label.is_empty() {
                self.label = Some(label);
            }
        }
        Ok(self)
    }

    /// The label to report, falling back to [`ANONYMOUS_LABEL`].
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(ANONYMOUS_LABEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = BridgeConfig::default();
        assert_eq!(config.unresolved, UnresolvedPolicy::Undefined);
        assert_eq!(config.label(), ANONYMOUS_LABEL);
    }

    #[test]
    fn test_parse_policy() {
        assert_eq!(
            "strict".parse::<UnresolvedPolicy>().unwrap(),
            UnresolvedPolicy::Strict
        );
        assert_eq!(
            " Undefined ".parse::<UnresolvedPolicy>().unwrap(),
            UnresolvedPolicy::Undefined
        );
        assert!("reject".parse::<UnresolvedPolicy>().is_err());
    }

    #[test]
    fn test_from_json() {
        let config =
            BridgeConfig::from_json_str(r#"{"label": "./main.js", "unresolved": "strict"}"#)
                .unwrap();
        assert_eq!(config.label(), "./main.js");
        assert_eq!(config.unresolved, UnresolvedPolicy::Strict);

        let partial = BridgeConfig::from_json_str("{}").unwrap();
        assert_eq!(partial, BridgeConfig::default());

        assert!(BridgeConfig::from_json_str(r#"{"unresolved": "maybe"}"#).is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"label": "lib/util.js"}}"#).unwrap();

        let config = BridgeConfig::from_file(file.path()).unwrap();
        assert_eq!(config.label.as_deref(), Some("lib/util.js"));
        assert_eq!(config.unresolved, UnresolvedPolicy::Undefined);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = BridgeConfig::from_file(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, BridgeError::Io(_)));
    }

    #[test]
    fn test_builder() {
        let config = BridgeConfig::labelled("m").with_unresolved(UnresolvedPolicy::Strict);
        assert_eq!(config.label(), "m");
        assert_eq!(config.unresolved, UnresolvedPolicy::Strict);
    }
}
