// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # eximport-bridge
//!
//! Live, cycle-tolerant bindings between modules whose import/export
//! statements were rewritten into calls against a runtime bridge.
//!
//! Each module gets a [`Bridge`] holding its [`Namespace`] and its body,
//! expressed as a [`ModuleBody`] that suspends right after every export
//! assignment. Importers read bindings lazily:
//!
//! - a read advances the producer just far enough to settle the name
//! - a read that would re-enter a body already running further up the stack
//!   (an import cycle) yields what is settled so far instead of recursing
//! - `export * from` statements are merged through [`Bridge::export_from`]
//!   and [`Bridge::execute`] runs the body until every declared wildcard has
//!   been merged
//!
//! ## Quick Start
//!
//! ```rust
//! use eximport_bridge::{prepare_bridge, Bridge, Statements, Value};
//!
//! let bridge = prepare_bridge(["answer"]);
//! bridge
//!     .execute(|| Statements::new().then(|b: &Bridge| b.export("answer", 42)))
//!     .unwrap();
//!
//! let imports = bridge.named([("local", "answer")]);
//! assert_eq!(imports.get("local"), Value::from(42));
//! assert_eq!(bridge.steps_taken(), 1);
//! ```
//!
//! ## Wildcard re-exports
//!
//! ```rust
//! use eximport_bridge::{prepare_bridge, Bridge, ExportName, Statements, Value};
//!
//! let other = prepare_bridge(["c"]);
//! other.commit([("c", 3)]).unwrap();
//!
//! let bridge = prepare_bridge([ExportName::from("a"), ExportName::Wildcard]);
//! bridge
//!     .execute(move || {
//!         Statements::new()
//!             .then(|b: &Bridge| b.export("a", 1))
//!             .then(move |b: &Bridge| {
//!                 b.export_all(&other);
//!                 Ok(())
//!             })
//!     })
//!     .unwrap();
//!
//! assert_eq!(bridge.namespace().peek("c"), Some(Value::from(3)));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bridge;
pub mod config;
pub mod error;
pub mod registry;
pub mod value;

// Re-exports
pub use bridge::{
    Bridge, CoroutineState, DEFAULT_EXPORT, ExportMap, ExportName, ModuleBody, NamedImports,
    Namespace, Statements, Step,
};
pub use config::{BridgeConfig, UnresolvedPolicy};
pub use error::{BridgeError, Result};
pub use registry::ModuleRegistry;
pub use value::{Function, Value};

/// Version of the eximport-bridge runtime
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Create a bridge for a module declaring `names`.
///
/// Each entry is an export identifier or [`ExportName::Wildcard`] (`None`
/// converts to the wildcard marker).
pub fn prepare_bridge<I, N>(names: I) -> Bridge
where
    I: IntoIterator<Item = N>,
    N: Into<ExportName>,
{
    Bridge::new(names)
}
