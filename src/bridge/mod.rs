// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Export/import bridges.
//!
//! A [`Bridge`] owns one module's [`Namespace`] and the suspended body that
//! produces its bindings. Bindings are pulled lazily: a read advances the
//! body just far enough to settle the requested name.
//!
//! ## Cycles
//!
//! When a body reads from a module that is itself waiting on this bridge,
//! the inner read finds the body mid-step and gives up instead of
//! re-entering it. The read yields whatever is already settled and the
//! cycle resolves once both bodies have run further.

mod coroutine;
mod linker;
mod namespace;
mod view;

pub use coroutine::{CoroutineState, ModuleBody, Statements, Step};
pub use linker::ExportMap;
pub use namespace::{DEFAULT_EXPORT, Namespace};
pub use view::NamedImports;

use coroutine::{Advance, CoroutineSlot};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, error, trace};

use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::value::Value;

/// An entry of the declared export list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExportName {
    /// A locally declared export (`export const foo`, `export { foo }`)
    Named(String),
    /// Marker for one `export * from '...'` statement
    Wildcard,
}

impl From<&str> for ExportName {
    fn from(name: &str) -> Self {
        ExportName::Named(name.to_string())
    }
}

impl From<String> for ExportName {
    fn from(name: String) -> Self {
        ExportName::Named(name)
    }
}

/// `None` is the wildcard marker.
impl From<Option<&str>> for ExportName {
    fn from(name: Option<&str>) -> Self {
        name.map_or(ExportName::Wildcard, ExportName::from)
    }
}

type Importer = Box<dyn FnOnce(&Namespace) + Send>;

pub(crate) struct BridgeInner {
    config: BridgeConfig,
    namespace: Namespace,
    coroutine: Mutex<CoroutineSlot>,
    steps: AtomicUsize,
    /// Hooks waiting for the module to load; `None` once loaded
    importers: Mutex<Option<Vec<Importer>>>,
}

/// Handle to one module's export surface and body.
///
/// Cloning is cheap; all clones refer to the same bridge.
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<BridgeInner>,
}

impl Bridge {
    /// Create a bridge for a module declaring `names`.
    pub fn new<I, N>(names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<ExportName>,
    {
        Self::with_config(names, BridgeConfig::default())
    }

    /// Create a bridge with explicit configuration.
    pub fn with_config<I, N>(names: I, config: BridgeConfig) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<ExportName>,
    {
        let names: Vec<ExportName> = names.into_iter().map(Into::into).collect();
        let inner = Arc::new_cyclic(|owner| BridgeInner {
            config,
            namespace: Namespace::new(owner.clone(), names),
            coroutine: Mutex::new(CoroutineSlot::new()),
            steps: AtomicUsize::new(0),
            importers: Mutex::new(Some(Vec::new())),
        });
        Self { inner }
    }

    pub(crate) fn from_inner(inner: Arc<BridgeInner>) -> Self {
        Self { inner }
    }

    /// The module label used in logs and errors.
    pub fn label(&self) -> &str {
        self.inner.config.label()
    }

    /// The bridge configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    /// The live export surface.
    pub fn namespace(&self) -> &Namespace {
        &self.inner.namespace
    }

    /// Current coroutine lifecycle state.
    pub fn state(&self) -> CoroutineState {
        match self.inner.coroutine.try_lock() {
            Some(slot) => slot.state,
            None => CoroutineState::Running,
        }
    }

    /// Number of times the body has been resumed.
    pub fn steps_taken(&self) -> usize {
        self.inner.steps.load(Ordering::Acquire)
    }

    /// Wildcard merges performed into this bridge.
    pub fn export_stars_seen(&self) -> usize {
        self.inner.namespace.export_stars_seen()
    }

    /// Returns true if both handles refer to the same bridge.
    pub fn ptr_eq(&self, other: &Bridge) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Attach the module body and advance it until every declared wildcard
    /// re-export has been merged.
    ///
    /// Calling this twice on the same bridge is a contract violation. The
    /// factory only runs when no body was attached yet.
    pub fn execute<F, B>(&self, factory: F) -> Result<()>
    where
        F: FnOnce() -> B,
        B: ModuleBody + 'static,
    {
        {
            let already = || BridgeError::AlreadyExecuted {
                module: self.label().to_string(),
            };
            let mut slot = self.inner.coroutine.try_lock().ok_or_else(already)?;
            if slot.state != CoroutineState::Pending {
                return Err(already());
            }
            slot.body = Some(Box::new(factory()));
            slot.state = CoroutineState::Suspended;
        }

        debug!(
            module = %self.label(),
            wildcards = self.namespace().wildcard_count(),
            "Executing module body"
        );

        while self.namespace().pending_wildcards() > 0 {
            if self.advance()? != Advance::Stepped {
                break;
            }
        }
        Ok(())
    }

    /// Run the body to completion. A no-op once it has completed.
    pub fn finish(&self) -> Result<()> {
        loop {
            match self.advance()? {
                Advance::Stepped => continue,
                Advance::Busy => {
                    debug!(module = %self.label(), "finish deferred: body is running");
                    return Ok(());
                }
                Advance::Idle | Advance::Exhausted => return Ok(()),
            }
        }
    }

    /// Settle a batch of declared exports at once.
    ///
    /// Nothing is written if any name is undeclared. On a bridge without a
    /// body, or whose body has completed, this also marks the module as
    /// loaded and runs queued importer hooks.
    pub fn commit<I, K, V>(&self, exports: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let exports: Vec<(K, V)> = exports.into_iter().collect();
        if let Some((name, _)) = exports
            .iter()
            .find(|(name, _)| !self.inner.namespace.is_declared(name.as_ref()))
        {
            return Err(BridgeError::undeclared(self.label(), name.as_ref()));
        }
        for (name, value) in exports {
            self.inner.namespace.set(name.as_ref(), value)?;
        }
        if matches!(
            self.state(),
            CoroutineState::Pending | CoroutineState::Completed
        ) {
            self.flush_importers();
        }
        Ok(())
    }

    /// Settle a single declared export.
    pub fn export(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.inner.namespace.set(name, value)
    }

    /// Register a hook to run with the namespace once the module has loaded.
    ///
    /// Runs immediately if the module already loaded.
    pub fn importer<F>(&self, hook: F)
    where
        F: FnOnce(&Namespace) + Send + 'static,
    {
        let mut pending = self.inner.importers.lock();
        if let Some(queue) = pending.as_mut() {
            queue.push(Box::new(hook));
            return;
        }
        drop(pending);
        hook(self.namespace());
    }

    /// Returns true once the body completed or a final commit happened.
    pub fn is_loaded(&self) -> bool {
        self.inner.importers.lock().is_none()
    }

    /// Build a consumer view mapping local names to this bridge's exports.
    pub fn named<I, L, R>(&self, imports: I) -> NamedImports
    where
        I: IntoIterator<Item = (L, R)>,
        L: Into<String>,
        R: Into<String>,
    {
        NamedImports::new(self.clone(), imports)
    }

    /// Resume the body by exactly one step.
    ///
    /// A body that failed keeps failing: every later call returns the
    /// stored error wrapped in [`BridgeError::Failed`].
    pub(crate) fn advance(&self) -> Result<Advance> {
        let Some(mut slot) = self.inner.coroutine.try_lock() else {
            debug!(module = %self.label(), "Refusing re-entrant advance");
            return Ok(Advance::Busy);
        };
        if let Some(cause) = slot.failure.as_ref() {
            return Err(BridgeError::failed(self.label(), Arc::clone(cause)));
        }

        let state = slot.state;
        let outcome = match state {
            CoroutineState::Pending => return Ok(Advance::Idle),
            CoroutineState::Completed | CoroutineState::Failed => return Ok(Advance::Exhausted),
            CoroutineState::Suspended | CoroutineState::Running => {
                let Some(body) = slot.body.as_mut() else {
                    return Ok(Advance::Exhausted);
                };
                let step = self.inner.steps.fetch_add(1, Ordering::AcqRel) + 1;
                trace!(module = %self.label(), step, "Resuming module body");
                body.resume(self)
            }
        };

        match outcome {
            Ok(Step::Yield) => {
                slot.state = CoroutineState::Suspended;
                Ok(Advance::Stepped)
            }
            Ok(Step::Complete) => {
                slot.state = CoroutineState::Completed;
                let body = slot.body.take();
                drop(slot);
                drop(body);
                debug!(
                    module = %self.label(),
                    steps = self.steps_taken(),
                    "Module body completed"
                );
                self.flush_importers();
                Ok(Advance::Stepped)
            }
            Err(err) => {
                let cause = Arc::new(err);
                slot.state = CoroutineState::Failed;
                slot.failure = Some(Arc::clone(&cause));
                let body = slot.body.take();
                drop(slot);
                drop(body);
                error!(module = %self.label(), "Module body failed: {}", cause);
                Err(BridgeError::failed(self.label(), cause))
            }
        }
    }

    fn flush_importers(&self) {
        let queued = self.inner.importers.lock().take();
        if let Some(queued) = queued {
            debug!(
                module = %self.label(),
                count = queued.len(),
                "Running importer hooks"
            );
            for hook in queued {
                hook(self.namespace());
            }
        }
    }
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new(Vec::<ExportName>::new())
    }
}

impl PartialEq for Bridge {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Bridge {}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("label", &self.label())
            .field("state", &self.state())
            .field("steps", &self.steps_taken())
            .finish()
    }
}
