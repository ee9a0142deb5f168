// SPDX-License-Identifier: Apache-2.0
//! Shared id-rewriting and resource-projection helpers used by every view.

use std::collections::{BTreeMap, HashMap};

use sysgraph_model::Action;

use crate::graph::GraphSource;

/// Rewrite `action`'s id, parent id, and child keys through `mapping`.
/// Ids missing from `mapping` (a dangling parent link pointing outside the
/// projected set) pass through unchanged — callers that need dangling
/// links erased instead (e.g. `Subgraph`) do that separately.
pub(crate) fn remap_action(mut action: Action, mapping: &HashMap<i64, i64>) -> Action {
    action.id = mapping.get(&action.id).copied().unwrap_or(action.id);
    action.parent_action_id = action.parent_action_id.map(|p| mapping.get(&p).copied().unwrap_or(p));
    let children = std::mem::take(&mut action.children);
    action.children = children
        .into_iter()
        .map(|(child_id, interaction)| (mapping.get(&child_id).copied().unwrap_or(child_id), interaction))
        .collect();
    action
}

/// A dense, ascending-id → offset mapping for the ids in `ids`, starting at
/// `start`. `ids` is sorted in place.
pub(crate) fn dense_mapping(ids: &mut [i64], start: i64) -> HashMap<i64, i64> {
    ids.sort_unstable();
    ids.iter()
        .enumerate()
        .map(|(i, &orig)| (orig, start + i as i64))
        .collect()
}

/// The subset of `source`'s resources actually referenced by `actions`'
/// inputs, outputs, or executable digest.
pub(crate) fn referenced_resources<P>(source: &P, actions: &BTreeMap<i64, Action>) -> BTreeMap<String, sysgraph_model::Resource>
where
    P: GraphSource + ?Sized,
{
    let mut resources = BTreeMap::new();
    for action in actions.values() {
        for digest_key in action.inputs.keys().chain(action.outputs.keys()) {
            if !resources.contains_key(digest_key) {
                if let Some(resource) = source.resource(digest_key) {
                    resources.insert(digest_key.clone(), resource);
                }
            }
        }
        if let Some(exec_digest) = &action.executable_resource_digest {
            let key = exec_digest.canonical();
            if !resources.contains_key(&key) {
                if let Some(resource) = source.resource(&key) {
                    resources.insert(key, resource);
                }
            }
        }
    }
    resources
}
