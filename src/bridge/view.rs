// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Consumer views (`import { remote as local } from '...'`).

use std::collections::BTreeMap;
use tracing::warn;

use super::Bridge;
use crate::error::{BridgeError, Result};
use crate::value::Value;

/// Read-only projection of another module's exports under local names.
///
/// Nothing is cached: every read consults the remote namespace, so
/// reassignments by the producer are observed.
#[derive(Debug, Clone)]
pub struct NamedImports {
    source: Bridge,
    bindings: BTreeMap<String, String>,
}

impl NamedImports {
    pub(crate) fn new<I, L, R>(source: Bridge, imports: I) -> Self
    where
        I: IntoIterator<Item = (L, R)>,
        L: Into<String>,
        R: Into<String>,
    {
        let bindings = imports
            .into_iter()
            .map(|(local, remote)| (local.into(), remote.into()))
            .collect();
        Self { source, bindings }
    }

    /// Read a local binding, surfacing unresolved outcomes as `undefined`.
    ///
    /// # Panics
    ///
    /// Panics when the producer broke the bridge contract, like
    /// [`Namespace::get`](super::Namespace::get).
    pub fn get(&self, local: &str) -> Value {
        match self.resolve(local) {
            Ok(value) => value,
            Err(err) if err.is_contract_violation() => panic!("{}", err),
            Err(err) => {
                warn!(module = %self.source.label(), local, "import read failed: {}", err);
                Value::Undefined
            }
        }
    }

    /// Read a local binding through the remote namespace.
    pub fn resolve(&self, local: &str) -> Result<Value> {
        let remote = self
            .bindings
            .get(local)
            .ok_or_else(|| BridgeError::UnknownImport(local.to_string()))?;
        self.source.namespace().resolve(remote)
    }

    /// The remote export name a local name refers to.
    pub fn remote_name(&self, local: &str) -> Option<&str> {
        self.bindings.get(local).map(String::as_str)
    }

    /// Local names provided by this view.
    pub fn locals(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    /// The bridge this view reads from.
    pub fn source(&self) -> &Bridge {
        &self.source
    }
}
