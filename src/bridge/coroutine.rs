// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Suspendable module bodies.
//!
//! A module body is a state machine resumed one step at a time. Each resume
//! runs forward to the next suspension point (right after an export
//! assignment or a wildcard re-export) and reports whether the body yielded
//! or ran to completion.

use std::collections::VecDeque;
use std::fmt;

use std::sync::Arc;

use super::Bridge;
use crate::error::{BridgeError, Result};

/// Outcome of resuming a module body once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The body reached a suspension point and can be resumed again
    Yield,
    /// The body ran to completion
    Complete,
}

/// Lifecycle of the coroutine attached to a bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoroutineState {
    /// No body attached yet
    Pending,
    /// Parked at a suspension point
    Suspended,
    /// Currently executing a step
    Running,
    /// Ran to completion
    Completed,
    /// A step returned an error; later advances report it again
    Failed,
}

/// A cooperatively suspendable module body.
///
/// The body receives its own bridge on every resume so it can settle its
/// exports, re-export from other bridges and read its imports.
pub trait ModuleBody: Send {
    /// Execute forward to the next suspension point.
    fn resume(&mut self, bridge: &Bridge) -> Result<Step>;
}

impl<F> ModuleBody for F
where
    F: FnMut(&Bridge) -> Result<Step> + Send,
{
    fn resume(&mut self, bridge: &Bridge) -> Result<Step> {
        self(bridge)
    }
}

type Statement = Box<dyn FnOnce(&Bridge) -> Result<()> + Send>;

/// A module body made of statements, each followed by a suspension point.
///
/// The resume after the last statement completes the body, so a body with
/// `n` statements yields `n` times.
#[derive(Default)]
pub struct Statements {
    pending: VecDeque<Statement>,
}

impl Statements {
    /// Creates an empty body.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a statement.
    pub fn then<F>(mut self, statement: F) -> Self
    where
        F: FnOnce(&Bridge) -> Result<()> + Send + 'static,
    {
        self.pending.push_back(Box::new(statement));
        self
    }

    /// Number of statements not yet run.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl ModuleBody for Statements {
    fn resume(&mut self, bridge: &Bridge) -> Result<Step> {
        match self.pending.pop_front() {
            Some(statement) => {
                statement(bridge)?;
                Ok(Step::Yield)
            }
            None => Ok(Step::Complete),
        }
    }
}

impl fmt::Debug for Statements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statements")
            .field("remaining", &self.pending.len())
            .finish()
    }
}

/// Result of asking a bridge to advance its body by one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Advance {
    /// One step ran
    Stepped,
    /// The body is mid-step further up the stack
    Busy,
    /// No body attached yet
    Idle,
    /// The body already completed
    Exhausted,
}

/// Storage for the body owned by a bridge.
pub(crate) struct CoroutineSlot {
    pub(crate) body: Option<Box<dyn ModuleBody>>,
    pub(crate) state: CoroutineState,
    /// Set together with `CoroutineState::Failed`
    pub(crate) failure: Option<Arc<BridgeError>>,
}

impl CoroutineSlot {
    pub(crate) fn new() -> Self {
        Self {
            body: None,
            state: CoroutineState::Pending,
            failure: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_statements_yield_then_complete() {
        let bridge = Bridge::new(["a", "b"]);
        let mut body = Statements::new()
            .then(|b: &Bridge| b.export("a", 1))
            .then(|b: &Bridge| b.export("b", 2));

        assert_eq!(body.remaining(), 2);
        assert_eq!(body.resume(&bridge).unwrap(), Step::Yield);
        assert_eq!(body.resume(&bridge).unwrap(), Step::Yield);
        assert_eq!(body.resume(&bridge).unwrap(), Step::Complete);
        assert_eq!(body.remaining(), 0);
        assert_eq!(bridge.namespace().get("b"), Value::from(2));
    }

    #[test]
    fn test_closure_body() {
        let bridge = Bridge::new(["n"]);
        let mut count = 0;
        let mut body = move |b: &Bridge| -> Result<Step> {
            count += 1;
            b.export("n", count)?;
            Ok(if count < 3 { Step::Yield } else { Step::Complete })
        };

        assert_eq!(body.resume(&bridge).unwrap(), Step::Yield);
        assert_eq!(body.resume(&bridge).unwrap(), Step::Yield);
        assert_eq!(body.resume(&bridge).unwrap(), Step::Complete);
        assert_eq!(bridge.namespace().get("n"), Value::from(3));
    }

    #[test]
    fn test_failing_statement() {
        let bridge = Bridge::new(["a"]);
        let mut body = Statements::new().then(|b: &Bridge| b.export("zzz", 1));
        assert!(body.resume(&bridge).is_err());
    }
}
