// SPDX-License-Identifier: Apache-2.0
//! `Edges`: a left-to-right pipeline of [`Traversal`] stages.

use std::collections::HashSet;

use sysgraph_query::{ActionProvider, ActionResourceProvider};

use crate::chain::Chain;
use crate::traversal::Traversal;

/// A pattern: a sequence of traversal stages run left to right. The first
/// stage is typically [`Traversal::AllActions`], seeding chains from the
/// empty chain; every later stage extends each chain produced so far.
pub struct Edges(Vec<Traversal>);

impl Edges {
    /// Build a pipeline from its ordered stages.
    pub fn new(stages: Vec<Traversal>) -> Self {
        Self(stages)
    }

    /// Run the pipeline, returning every resulting chain (one per path).
    pub fn all_chains<P>(&self, graph: &P) -> Vec<Chain>
    where
        P: ActionProvider + ActionResourceProvider + ?Sized,
    {
        let mut chains = vec![Chain::empty()];
        for stage in &self.0 {
            chains = chains.iter().flat_map(|chain| stage.step(graph, chain)).collect();
        }
        chains
    }

    /// Run the pipeline, deduplicating by `(action-id sequence,
    /// sorted extracted-value fingerprint)`.
    pub fn all_unique_chains<P>(&self, graph: &P) -> Vec<Chain>
    where
        P: ActionProvider + ActionResourceProvider + ?Sized,
    {
        let mut seen = HashSet::new();
        self.all_chains(graph).into_iter().filter(|chain| seen.insert(chain.fingerprint())).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::action_matcher::Predicate;
    use std::collections::BTreeMap as Map;
    use sysgraph_model::{Action, ActionInteraction, Resource};

    struct FakeGraph {
        actions: Map<i64, Action>,
    }

    impl ActionProvider for FakeGraph {
        fn action_ids(&self) -> Vec<i64> {
            self.actions.keys().copied().collect()
        }
        fn action(&self, id: i64) -> Option<Action> {
            self.actions.get(&id).cloned()
        }
        fn entry_point_action_ids(&self) -> Vec<i64> {
            self.actions.values().filter(|a| a.parent_action_id.is_none()).map(|a| a.id).collect()
        }
    }

    impl ActionResourceProvider for FakeGraph {
        fn resource(&self, _digest_key: &str) -> Option<Resource> {
            None
        }
    }

    fn chain_graph() -> FakeGraph {
        let mut root = Action::new(1, "g1");
        root.children.insert(2, ActionInteraction { timestamp: 0 });
        let mut child = Action::new(2, "g1");
        child.parent_action_id = Some(1);
        FakeGraph {
            actions: Map::from([(1, root), (2, child)]),
        }
    }

    #[test]
    fn all_chains_follows_seed_then_children() {
        let graph = chain_graph();
        let pipeline = Edges::new(vec![Traversal::AllActions(Box::new(Predicate(|a: &Action| a.id == 1))), Traversal::ParentToChildren]);
        let chains = pipeline.all_chains(&graph);
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].actions.iter().map(|a| a.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn all_unique_chains_dedupes_identical_paths() {
        let graph = chain_graph();
        let pipeline = Edges::new(vec![Traversal::AllActions(Box::new(Predicate(|_: &Action| true))), Traversal::ChildToParent]);
        let unique = pipeline.all_unique_chains(&graph);
        let all = pipeline.all_chains(&graph);
        assert!(unique.len() <= all.len());
    }
}
