// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the export/import bridge

use std::sync::Arc;
use thiserror::Error;

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors that can occur while exchanging bindings between modules
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A module body was attached to a bridge that already has one
    #[error("Module body already attached to '{module}'")]
    AlreadyExecuted {
        /// Module label
        module: String,
    },

    /// The producer wrote a name it never declared
    #[error("'{name}' is not a declared export of '{module}'")]
    UndeclaredExport {
        /// Module label
        module: String,
        /// Export name
        name: String,
    },

    /// The producer completed without settling a requested export
    #[error("Export '{name}' not found in '{module}'")]
    ExportNotFound {
        /// Module label
        module: String,
        /// Export name
        name: String,
    },

    /// A consumer view has no binding for the requested local name
    #[error("No import binding named '{0}'")]
    UnknownImport(String),

    /// A module body failed while being advanced
    #[error("{0}")]
    Body(String),

    /// A module body failed on an earlier step; every later advance reports it
    #[error("Module '{module}' failed: {source}")]
    Failed {
        /// Module label
        module: String,
        /// The error the body originally returned
        source: Arc<BridgeError>,
    },

    /// File system error
    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl BridgeError {
    /// Create an error raised by a module body
    pub fn body(msg: impl Into<String>) -> Self {
        Self::Body(msg.into())
    }

    /// Create an undeclared-export error
    pub fn undeclared(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self::UndeclaredExport {
            module: module.into(),
            name: name.into(),
        }
    }

    /// Create an export-not-found error
    pub fn export_not_found(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self::ExportNotFound {
            module: module.into(),
            name: name.into(),
        }
    }

    /// Wrap the stored failure of a module body
    pub fn failed(module: impl Into<String>, source: Arc<BridgeError>) -> Self {
        Self::Failed {
            module: module.into(),
            source,
        }
    }

    /// Returns true for errors that indicate a mismatch between the generated
    /// glue code and the bridge contract.
    pub fn is_contract_violation(&self) -> bool {
        match self {
            Self::AlreadyExecuted { .. } | Self::UndeclaredExport { .. } => true,
            Self::Failed { source, .. } => source.is_contract_violation(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = BridgeError::undeclared("./a.js", "foo");
        assert_eq!(err.to_string(), "'foo' is not a declared export of './a.js'");

        let err = BridgeError::export_not_found("./b.js", "bar");
        assert_eq!(err.to_string(), "Export 'bar' not found in './b.js'");

        let err = BridgeError::body("boom");
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_contract_violations() {
        assert!(BridgeError::undeclared("m", "x").is_contract_violation());
        assert!(
            BridgeError::AlreadyExecuted {
                module: "m".to_string()
            }
            .is_contract_violation()
        );
        assert!(!BridgeError::export_not_found("m", "x").is_contract_violation());
        assert!(!BridgeError::UnknownImport("x".to_string()).is_contract_violation());
    }

    #[test]
    fn test_failed_keeps_cause() {
        let cause = Arc::new(BridgeError::undeclared("./a.js", "typo"));
        let err = BridgeError::failed("./a.js", Arc::clone(&cause));
        assert_eq!(
            err.to_string(),
            "Module './a.js' failed: 'typo' is not a declared export of './a.js'"
        );
        assert!(err.is_contract_violation());

        let err = BridgeError::failed("./b.js", Arc::new(BridgeError::body("boom")));
        assert!(!err.is_contract_violation());
        assert!(std::error::Error::source(&err).is_some());
    }
}
