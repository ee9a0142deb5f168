// SPDX-License-Identifier: Apache-2.0
//! Traversal kinds: given a running [`Chain`], each returns zero or more
//! extended chains.

use std::collections::BTreeMap;

use sysgraph_query::{ActionProvider, ActionResourceProvider};

use crate::action_matcher::ActionMatcher;
use crate::chain::Chain;
use crate::resource_matcher::ResourceMatcher;
use crate::value::Extraction;

/// One step of a pattern: how to extend a [`Chain`] by looking at the
/// graph around its last action.
pub enum Traversal {
    /// Seeds chains from every action matching `matcher`, ignoring the
    /// incoming chain.
    AllActions(Box<dyn ActionMatcher>),
    /// Extends the chain with every child of the current action.
    ParentToChildren,
    /// Extends the chain with the current action's parent, if any.
    ChildToParent,
    /// Walks every ancestor of the current action; every one must match
    /// `matcher`, and the chain is extended with all of them at once.
    ToAllAncestors(Box<dyn ActionMatcher>),
    /// Walks every ancestor of the current action, branching into one
    /// extended chain per ancestor that matches `matcher`.
    ToAnyAncestor(Box<dyn ActionMatcher>),
    /// For each output of the current action whose resource matches
    /// `resource`, follows to every other action that consumes it as an
    /// input and matches `action`.
    OutputToInput {
        /// Matcher narrowing which output resource to follow.
        resource: Box<dyn ResourceMatcher>,
        /// Matcher the consuming action must satisfy.
        action: Box<dyn ActionMatcher>,
    },
    /// Symmetric to [`Self::OutputToInput`]: follows an input resource to
    /// the action that produced it.
    InputToProducer {
        /// Matcher narrowing which input resource to follow.
        resource: Box<dyn ResourceMatcher>,
        /// Matcher the producing action must satisfy.
        action: Box<dyn ActionMatcher>,
    },
    /// Matches when the current action has an input matching `resource`
    /// that no action in the graph produces as an output.
    UnproducedResource(Box<dyn ResourceMatcher>),
}

impl Traversal {
    pub(crate) fn step<P>(&self, graph: &P, chain: &Chain) -> Vec<Chain>
    where
        P: ActionProvider + ActionResourceProvider + ?Sized,
    {
        match self {
            Self::AllActions(matcher) => graph
                .action_ids()
                .into_iter()
                .filter_map(|id| graph.action(id))
                .filter_map(|action| {
                    let extraction = matcher.eval(&action)?;
                    Some(chain.extended(action, extraction))
                })
                .collect(),
            Self::ParentToChildren => {
                let Some(current) = chain.last() else {
                    return Vec::new();
                };
                current
                    .children
                    .keys()
                    .copied()
                    .filter_map(|id| graph.action(id))
                    .map(|child| chain.extended(child, Extraction::new()))
                    .collect()
            }
            Self::ChildToParent => {
                let Some(current) = chain.last() else {
                    return Vec::new();
                };
                current
                    .parent_action_id
                    .and_then(|id| graph.action(id))
                    .map(|parent| chain.extended(parent, Extraction::new()))
                    .into_iter()
                    .collect()
            }
            Self::ToAllAncestors(matcher) => Self::to_all_ancestors(graph, chain, matcher.as_ref()),
            Self::ToAnyAncestor(matcher) => Self::to_any_ancestor(graph, chain, matcher.as_ref()),
            Self::OutputToInput { resource, action } => Self::output_to_input(graph, chain, resource.as_ref(), action.as_ref()),
            Self::InputToProducer { resource, action } => Self::input_to_producer(graph, chain, resource.as_ref(), action.as_ref()),
            Self::UnproducedResource(matcher) => Self::unproduced_resource(graph, chain, matcher.as_ref()),
        }
    }

    fn to_all_ancestors<P>(graph: &P, chain: &Chain, matcher: &dyn ActionMatcher) -> Vec<Chain>
    where
        P: ActionProvider + ?Sized,
    {
        let Some(current) = chain.last() else {
            return Vec::new();
        };
        let mut ancestors = Vec::new();
        let mut extraction_acc = Extraction::new();
        let mut cursor = current.parent_action_id;
        while let Some(id) = cursor {
            let Some(ancestor) = graph.action(id) else {
                return Vec::new();
            };
            let Some(extraction) = matcher.eval(&ancestor) else {
                return Vec::new();
            };
            extraction_acc.extend(extraction);
            cursor = ancestor.parent_action_id;
            ancestors.push(ancestor);
        }
        if ancestors.is_empty() {
            return Vec::new();
        }
        let mut result = chain.clone();
        for ancestor in ancestors {
            result = result.extended(ancestor, Extraction::new());
        }
        vec![result.with_extraction(extraction_acc)]
    }

    fn to_any_ancestor<P>(graph: &P, chain: &Chain, matcher: &dyn ActionMatcher) -> Vec<Chain>
    where
        P: ActionProvider + ?Sized,
    {
        let Some(current) = chain.last() else {
            return Vec::new();
        };
        let mut results = Vec::new();
        let mut cursor = current.parent_action_id;
        while let Some(id) = cursor {
            let Some(ancestor) = graph.action(id) else {
                break;
            };
            if let Some(extraction) = matcher.eval(&ancestor) {
                results.push(chain.extended(ancestor.clone(), extraction));
            }
            cursor = ancestor.parent_action_id;
        }
        results
    }

    fn output_to_input<P>(graph: &P, chain: &Chain, resource: &dyn ResourceMatcher, action: &dyn ActionMatcher) -> Vec<Chain>
    where
        P: ActionProvider + ActionResourceProvider + ?Sized,
    {
        let Some(current) = chain.last() else {
            return Vec::new();
        };
        let mut results = Vec::new();
        for digest_key in current.outputs.keys() {
            let Some(resource_extraction) = graph.resource(digest_key).and_then(|res| resource.eval(&res)) else {
                continue;
            };
            for id in graph.action_ids() {
                if id == current.id {
                    continue;
                }
                let Some(candidate) = graph.action(id) else {
                    continue;
                };
                if !candidate.inputs.contains_key(digest_key) {
                    continue;
                }
                let Some(action_extraction) = action.eval(&candidate) else {
                    continue;
                };
                results.push(chain.extended(candidate, merged(&resource_extraction, action_extraction)));
            }
        }
        results
    }

    fn input_to_producer<P>(graph: &P, chain: &Chain, resource: &dyn ResourceMatcher, action: &dyn ActionMatcher) -> Vec<Chain>
    where
        P: ActionProvider + ActionResourceProvider + ?Sized,
    {
        let Some(current) = chain.last() else {
            return Vec::new();
        };
        let mut results = Vec::new();
        for digest_key in current.inputs.keys() {
            let Some(resource_extraction) = graph.resource(digest_key).and_then(|res| resource.eval(&res)) else {
                continue;
            };
            for id in graph.action_ids() {
                if id == current.id {
                    continue;
                }
                let Some(candidate) = graph.action(id) else {
                    continue;
                };
                if !candidate.outputs.contains_key(digest_key) {
                    continue;
                }
                let Some(action_extraction) = action.eval(&candidate) else {
                    continue;
                };
                results.push(chain.extended(candidate, merged(&resource_extraction, action_extraction)));
            }
        }
        results
    }

    fn unproduced_resource<P>(graph: &P, chain: &Chain, matcher: &dyn ResourceMatcher) -> Vec<Chain>
    where
        P: ActionProvider + ActionResourceProvider + ?Sized,
    {
        let Some(current) = chain.last() else {
            return Vec::new();
        };
        let mut results = Vec::new();
        for digest_key in current.inputs.keys() {
            let Some(extraction) = graph.resource(digest_key).and_then(|res| matcher.eval(&res)) else {
                continue;
            };
            let produced = graph.action_ids().into_iter().filter_map(|id| graph.action(id)).any(|a| a.outputs.contains_key(digest_key));
            if produced {
                continue;
            }
            results.push(chain.with_extraction(extraction));
        }
        results
    }
}

fn merged(first: &Extraction, second: Extraction) -> Extraction {
    let mut combined: BTreeMap<_, _> = first.clone();
    combined.extend(second);
    combined
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sysgraph_digest::Digest;
    use sysgraph_model::{Action, ActionInteraction, FileType, Resource, ResourceInteraction};
    use std::collections::BTreeMap as Map;

    struct FakeGraph {
        actions: Map<i64, Action>,
        resources: Map<String, Resource>,
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
        fn resource(&self, digest_key: &str) -> Option<Resource> {
            self.resources.get(digest_key).cloned()
        }
    }

    fn file_resource(path: &str) -> (String, Resource) {
        let digest = Digest::of_bytes(path.as_bytes());
        let resource = Resource::File {
            path: path.to_string(),
            digest,
            file_type: FileType::Regular,
        };
        (resource.digest().canonical(), resource)
    }

    #[test]
    fn parent_to_children_visits_every_child() {
        let mut parent = Action::new(1, "g1");
        parent.children.insert(2, ActionInteraction { timestamp: 0 });
        parent.children.insert(3, ActionInteraction { timestamp: 1 });
        let child_a = Action::new(2, "g1");
        let child_b = Action::new(3, "g1");
        let graph = FakeGraph {
            actions: Map::from([(1, parent), (2, child_a), (3, child_b)]),
            resources: Map::new(),
        };

        let chain = Chain::empty().extended(graph.action(1).unwrap(), Extraction::new());
        let results = Traversal::ParentToChildren.step(&graph, &chain);
        let mut ids: Vec<i64> = results.iter().map(|c| c.last().unwrap().id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn output_to_input_follows_matching_consumers() {
        let (digest_key, resource) = file_resource("a/out");
        let mut writer = Action::new(1, "g1");
        writer.outputs.insert(digest_key.clone(), vec![ResourceInteraction { timestamp: 0, io_info: None }]);
        let mut reader = Action::new(2, "g1");
        reader.inputs.insert(digest_key.clone(), vec![ResourceInteraction { timestamp: 1, io_info: None }]);
        let graph = FakeGraph {
            actions: Map::from([(1, writer), (2, reader)]),
            resources: Map::from([(digest_key, resource)]),
        };

        let chain = Chain::empty().extended(graph.action(1).unwrap(), Extraction::new());
        let traversal = Traversal::OutputToInput {
            resource: Box::new(crate::resource_matcher::PathPrefix("a/".to_string())),
            action: Box::new(crate::action_matcher::Predicate(|_: &Action| true)),
        };
        let results = traversal.step(&graph, &chain);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].last().unwrap().id, 2);
    }

    #[test]
    fn unproduced_resource_matches_when_no_action_outputs_it() {
        let (digest_key, resource) = file_resource("a/missing");
        let mut reader = Action::new(1, "g1");
        reader.inputs.insert(digest_key.clone(), vec![ResourceInteraction { timestamp: 0, io_info: None }]);
        let graph = FakeGraph {
            actions: Map::from([(1, reader)]),
            resources: Map::from([(digest_key, resource)]),
        };

        let chain = Chain::empty().extended(graph.action(1).unwrap(), Extraction::new());
        let traversal = Traversal::UnproducedResource(Box::new(crate::resource_matcher::PathPrefix("a/".to_string())));
        assert_eq!(traversal.step(&graph, &chain).len(), 1);
    }
}
