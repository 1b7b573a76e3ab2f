// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Live export surface of a module.
//!
//! Reading a binding pulls the owning bridge's body forward one step at a
//! time until the name settles or the body can make no further progress.

use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Weak;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{trace, warn};

use super::coroutine::{Advance, CoroutineState};
use super::{Bridge, BridgeInner, ExportName};
use crate::config::{ANONYMOUS_LABEL, UnresolvedPolicy};
use crate::error::{BridgeError, Result};
use crate::value::Value;

/// Name of the default export slot every namespace reserves.
pub const DEFAULT_EXPORT: &str = "default";

/// A module namespace.
pub struct Namespace {
    /// Owning bridge, used only to advance its body
    owner: Weak<BridgeInner>,
    /// Names that may be written; grows when the linker introduces names
    declared: RwLock<BTreeSet<String>>,
    /// Number of wildcard markers declared
    wildcards: usize,
    /// Wildcard merges performed so far
    stars_seen: AtomicUsize,
    /// Settled bindings
    values: RwLock<BTreeMap<String, Value>>,
}

impl Namespace {
    pub(crate) fn new(owner: Weak<BridgeInner>, names: Vec<ExportName>) -> Self {
        let mut declared = BTreeSet::new();
        declared.insert(DEFAULT_EXPORT.to_string());
        let mut wildcards = 0;

        for name in names {
            match name {
                ExportName::Named(name) => {
                    declared.insert(name);
                }
                ExportName::Wildcard => wildcards += 1,
            }
        }

        Self {
            owner,
            declared: RwLock::new(declared),
            wildcards,
            stars_seen: AtomicUsize::new(0),
            values: RwLock::new(BTreeMap::new()),
        }
    }

    /// Read a binding, surfacing unresolved outcomes as `undefined`.
    ///
    /// # Panics
    ///
    /// Panics when the owning body broke the bridge contract, for example by
    /// writing an export it never declared. Use [`Namespace::resolve`] to
    /// receive that error instead.
    pub fn get(&self, name: &str) -> Value {
        match self.resolve(name) {
            Ok(value) => value,
            Err(err) if err.is_contract_violation() => panic!("{}", err),
            Err(err) => {
                warn!(module = %self.label(), export = name, "export read failed: {}", err);
                Value::Undefined
            }
        }
    }

    /// Read a binding, advancing the owning body as far as needed.
    ///
    /// A read that cannot progress because the body is already running
    /// further up the stack yields whatever is settled, usually `undefined`.
    pub fn resolve(&self, name: &str) -> Result<Value> {
        if let Some(value) = self.pull(name)? {
            return Ok(value);
        }

        let owner = self.owner();
        let strict = owner
            .as_ref()
            .is_some_and(|bridge| bridge.config().unresolved == UnresolvedPolicy::Strict);
        let completed = owner
            .as_ref()
            .is_some_and(|bridge| {
                matches!(
                    bridge.state(),
                    CoroutineState::Completed | CoroutineState::Failed
                )
            });

        if strict && completed {
            return Err(BridgeError::export_not_found(self.label(), name));
        }
        Ok(Value::Undefined)
    }

    /// Settle a declared binding. Later writes overwrite the value.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        if !self.is_declared(name) {
            return Err(BridgeError::undeclared(self.label(), name));
        }
        let value = value.into();
        trace!(
            module = %self.label(),
            export = name,
            kind = value.type_of(),
            value = %value,
            "settled"
        );
        self.values.write().insert(name.to_string(), value);
        Ok(())
    }

    /// Returns the value of a settled binding without advancing the body.
    pub fn peek(&self, name: &str) -> Option<Value> {
        self.values.read().get(name).cloned()
    }

    /// Returns true if the binding has a value.
    pub fn is_settled(&self, name: &str) -> bool {
        self.values.read().contains_key(name)
    }

    /// Returns true if the name may be written by the producer.
    pub fn is_declared(&self, name: &str) -> bool {
        self.declared.read().contains(name)
    }

    /// All declared names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.declared.read().iter().cloned().collect()
    }

    /// Copy of every settled binding.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.values.read().clone()
    }

    /// Number of wildcard markers declared.
    pub fn wildcard_count(&self) -> usize {
        self.wildcards
    }

    /// Number of wildcard merges performed.
    pub fn export_stars_seen(&self) -> usize {
        self.stars_seen.load(Ordering::Acquire)
    }

    /// Wildcard markers not yet matched by a merge.
    pub fn pending_wildcards(&self) -> usize {
        self.wildcards.saturating_sub(self.export_stars_seen())
    }

    /// Advance the owner until `name` settles. `None` when it could not be.
    pub(crate) fn pull(&self, name: &str) -> Result<Option<Value>> {
        loop {
            if let Some(value) = self.peek(name) {
                return Ok(Some(value));
            }
            // Undeclared names can only arrive through an outstanding wildcard
            if !self.is_declared(name) && self.pending_wildcards() == 0 {
                return Ok(None);
            }
            let Some(owner) = self.owner() else {
                return Ok(None);
            };
            match owner.advance()? {
                Advance::Stepped => continue,
                Advance::Busy | Advance::Idle | Advance::Exhausted => return Ok(None),
            }
        }
    }

    /// Declare a name on behalf of the linker, settling it when a value is known.
    pub(crate) fn define(&self, name: &str, value: Option<Value>) {
        self.declared.write().insert(name.to_string());
        if let Some(value) = value {
            self.values.write().insert(name.to_string(), value);
        }
    }

    pub(crate) fn record_star(&self) -> usize {
        self.stars_seen.fetch_add(1, Ordering::AcqRel) + 1
    }

    fn owner(&self) -> Option<Bridge> {
        self.owner.upgrade().map(Bridge::from_inner)
    }

    fn label(&self) -> String {
        self.owner()
            .map(|bridge| bridge.label().to_string())
            .unwrap_or_else(|| ANONYMOUS_LABEL.to_string())
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("declared", &*self.declared.read())
            .field("wildcards", &self.wildcards)
            .field("stars_seen", &self.export_stars_seen())
            .field("values", &*self.values.read())
            .finish()
    }
}
