// SPDX-License-Identifier: Apache-2.0
//! A running match: the actions visited so far plus the values named
//! matchers have captured along the way.

use std::collections::BTreeMap;

use sysgraph_model::Action;

use crate::value::{Extraction, ExtractedValue};

/// A path through the graph built up by an [`crate::Edges`] pipeline.
#[derive(Debug, Clone, Default)]
pub struct Chain {
    /// Actions visited so far, in traversal order.
    pub actions: Vec<Action>,
    /// Named values captured by `ExtractAs`-wrapped matchers along the way.
    pub extracted: BTreeMap<String, ExtractedValue>,
}

impl Chain {
    /// A chain with no actions and no extracted values, the starting point
    /// for every `Edges` pipeline.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The most recently visited action, or `None` before any traversal
    /// stage has run.
    pub fn last(&self) -> Option<&Action> {
        self.actions.last()
    }

    /// A stable identity for this chain: the visited action ids in order,
    /// and a sorted `name=value` fingerprint of every extracted value. Used
    /// by `AllUniqueChains` to deduplicate without requiring `Action`/
    /// `Resource` to implement `Hash`.
    pub fn fingerprint(&self) -> (Vec<i64>, Vec<String>) {
        let ids = self.actions.iter().map(|a| a.id).collect();
        let mut values: Vec<String> = self.extracted.iter().map(|(name, value)| format!("{name}={}", value.fingerprint())).collect();
        values.sort_unstable();
        (ids, values)
    }

    pub(crate) fn extended(&self, action: Action, extra: Extraction) -> Self {
        let mut actions = self.actions.clone();
        actions.push(action);
        let mut extracted = self.extracted.clone();
        extracted.extend(extra);
        Self { actions, extracted }
    }

    pub(crate) fn with_extraction(&self, extra: Extraction) -> Self {
        let mut extracted = self.extracted.clone();
        extracted.extend(extra);
        Self {
            actions: self.actions.clone(),
            extracted,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_chain_has_no_last_action() {
        assert!(Chain::empty().last().is_none());
    }

    #[test]
    fn extended_appends_action_and_merges_extraction() {
        let chain = Chain::empty();
        let mut extra = Extraction::new();
        extra.insert("root".to_string(), ExtractedValue::Action(Action::new(1, "g1")));
        let extended = chain.extended(Action::new(1, "g1"), extra);
        assert_eq!(extended.last().unwrap().id, 1);
        assert!(extended.extracted.contains_key("root"));
    }

    #[test]
    fn fingerprint_is_stable_for_equal_chains() {
        let mut a = Chain::empty();
        a = a.extended(Action::new(1, "g1"), Extraction::new());
        let mut b = Chain::empty();
        b = b.extended(Action::new(1, "g1"), Extraction::new());
        assert_eq!(a.fingerprint(), b.fingerprint());
    }
}
