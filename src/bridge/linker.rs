// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Re-exports across bridges (`export ... from`).

use std::collections::BTreeMap;
use tracing::debug;

use super::namespace::DEFAULT_EXPORT;
use super::Bridge;
use crate::error::Result;

/// Local export name mapped to the remote export it forwards.
pub type ExportMap = BTreeMap<String, String>;

impl Bridge {
    /// Re-export bindings of `required`.
    ///
    /// With a map this is `export { remote as local } from '...'`; without
    /// one it is `export * from '...'`.
    pub fn export_from(&self, required: &Bridge, map: Option<&ExportMap>) -> Result<()> {
        match map {
            Some(map) => self.export_named(
                required,
                map.iter().map(|(local, remote)| (local.as_str(), remote.as_str())),
            ),
            None => {
                self.export_all(required);
                Ok(())
            }
        }
    }

    /// Forward selected bindings of `required` under local names.
    ///
    /// Each remote read may advance `required`. A remote binding that cannot
    /// settle yet (cyclic demand) leaves the local name declared but unsettled.
    pub fn export_named<I, L, R>(&self, required: &Bridge, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = (L, R)>,
        L: AsRef<str>,
        R: AsRef<str>,
    {
        for (local, remote) in pairs {
            let (local, remote) = (local.as_ref(), remote.as_ref());
            let value = required.namespace().pull(remote)?;
            debug!(
                module = %self.label(),
                from = %required.label(),
                local,
                remote,
                settled = value.is_some(),
                "Named re-export"
            );
            self.namespace().define(local, value);
        }
        Ok(())
    }

    /// Merge every binding currently settled on `required`, except `default`.
    ///
    /// Only what is settled at call time is copied; bodies re-run the merge
    /// when they expose more names.
    pub fn export_all(&self, required: &Bridge) {
        let entries: Vec<_> = required
            .namespace()
            .snapshot()
            .into_iter()
            .filter(|(name, _)| name != DEFAULT_EXPORT)
            .collect();

        let count = entries.len();
        for (name, value) in entries {
            self.namespace().define(&name, Some(value));
        }
        let seen = self.namespace().record_star();

        debug!(
            module = %self.label(),
            from = %required.label(),
            count,
            seen,
            declared = self.namespace().wildcard_count(),
            "Wildcard re-export"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::Statements;
    use crate::value::Value;

    fn settled_remote() -> Bridge {
        let remote = Bridge::new(["c", "d"]);
        remote
            .commit([("c", Value::from(3)), ("default", Value::from(9))])
            .unwrap();
        remote
    }

    #[test]
    fn test_wildcard_merge_skips_default() {
        let remote = settled_remote();
        let local = Bridge::new([Some("a"), None]);
        local.export("default", 5).unwrap();

        local.export_from(&remote, None).unwrap();

        assert_eq!(local.export_stars_seen(), 1);
        assert_eq!(local.namespace().pending_wildcards(), 0);
        assert_eq!(local.namespace().get("c"), Value::from(3));
        assert_eq!(local.namespace().get("default"), Value::from(5));
        assert!(!local.namespace().is_settled("d"));
    }

    #[test]
    fn test_wildcard_merge_does_not_copy_remote_default() {
        let remote = settled_remote();
        let local = Bridge::new([None::<&str>]);
        local.export_all(&remote);
        assert!(!local.namespace().is_settled("default"));
    }

    #[test]
    fn test_wildcard_merge_is_a_snapshot() {
        let remote = Bridge::new(["x", "y"]);
        remote.export("x", 1).unwrap();

        let local = Bridge::new([None::<&str>]);
        local.export_all(&remote);
        remote.export("y", 2).unwrap();

        assert!(!local.namespace().is_settled("y"));
        local.export_all(&remote);
        assert_eq!(local.namespace().get("y"), Value::from(2));
        assert_eq!(local.export_stars_seen(), 2);
    }

    #[test]
    fn test_named_reexport_pulls_remote() {
        let remote = Bridge::new(["inner"]);
        remote
            .execute(|| Statements::new().then(|b: &Bridge| b.export("inner", "v")))
            .unwrap();

        let local = Bridge::new(["mine"]);
        let mut map = ExportMap::new();
        map.insert("outer".to_string(), "inner".to_string());
        local.export_from(&remote, Some(&map)).unwrap();

        assert_eq!(remote.steps_taken(), 1);
        assert_eq!(local.namespace().get("outer"), Value::from("v"));
        assert!(local.namespace().is_declared("outer"));
        assert_eq!(local.export_stars_seen(), 0);
    }

    #[test]
    fn test_named_reexport_of_unsettled_name_stays_unsettled() {
        let remote = Bridge::new(["later"]);
        let local = Bridge::new(Vec::<&str>::new());

        local.export_named(&remote, [("alias", "later")]).unwrap();
        assert!(local.namespace().is_declared("alias"));
        assert!(!local.namespace().is_settled("alias"));

        // Declared names accept the producer's own write later on
        local.export("alias", 1).unwrap();
        assert_eq!(local.namespace().get("alias"), Value::from(1));
    }
}
