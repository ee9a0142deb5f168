// SPDX-License-Identifier: Apache-2.0
//! `Subgraph` and `SubgraphForRoots`: restrict to actions reachable by
//! child edges from a set of roots.

use std::collections::{BTreeMap, HashSet, VecDeque};

use sysgraph_query::ActionProvider;
use sysgraph_util::Cancel;

use crate::error::TransformError;
use crate::graph::{GraphSource, StaticGraph};
use crate::remap::referenced_resources;

fn closure<P>(source: &P, cancel: &Cancel, roots: &[i64]) -> Result<HashSet<i64>, TransformError>
where
    P: GraphSource + ?Sized,
{
    let mut keep: HashSet<i64> = roots.iter().copied().collect();
    let mut frontier: VecDeque<i64> = roots.iter().copied().collect();
    while let Some(id) = frontier.pop_front() {
        if cancel.is_cancelled() {
            return Err(TransformError::Cancelled);
        }
        let action = source.action(id).ok_or(TransformError::ActionNotFound(id))?;
        for &child_id in action.children.keys() {
            if keep.insert(child_id) {
                frontier.push_back(child_id);
            }
        }
    }
    Ok(keep)
}

/// Restrict `source` to actions reachable by child edges from `roots`.
/// Parent links pointing outside the kept set are erased; entry points are
/// recomputed as the kept actions with no surviving parent link.
pub fn subgraph<P>(source: &P, cancel: &Cancel, roots: &[i64]) -> Result<StaticGraph, TransformError>
where
    P: GraphSource + ?Sized,
{
    let keep = closure(source, cancel, roots)?;

    let mut actions = BTreeMap::new();
    for &id in &keep {
        let mut action = source.action(id).ok_or(TransformError::ActionNotFound(id))?;
        if action.parent_action_id.is_some_and(|p| !keep.contains(&p)) {
            action.parent_action_id = None;
            action.parent = None;
        }
        action.children.retain(|child_id, _| keep.contains(child_id));
        actions.insert(id, action);
    }

    let mut entry_points: Vec<i64> = actions.values().filter(|a| a.parent_action_id.is_none()).map(|a| a.id).collect();
    entry_points.sort_unstable();

    let mut header = source.header();
    header.entry_point_action_ids = entry_points;
    let resources = referenced_resources(source, &actions);
    Ok(StaticGraph::new(header, actions, resources))
}

/// Same as [`subgraph`], but first drops any root that is itself reachable
/// by child edges from another root.
pub fn subgraph_for_roots<P>(source: &P, cancel: &Cancel, roots: &[i64]) -> Result<StaticGraph, TransformError>
where
    P: GraphSource + ?Sized,
{
    let mut effective_roots = Vec::with_capacity(roots.len());
    for (i, &root) in roots.iter().enumerate() {
        let others: Vec<i64> = roots
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .map(|(_, &r)| r)
            .collect();
        let reachable_from_others = closure(source, cancel, &others)?;
        if !reachable_from_others.contains(&root) {
            effective_roots.push(root);
        }
    }
    subgraph(source, cancel, &effective_roots)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sysgraph_model::{Action, ActionInteraction, SysGraphHeader};

    fn chain() -> StaticGraph {
        let header = SysGraphHeader::new("g1");
        let mut a = Action::new(1, "g1");
        a.children.insert(2, ActionInteraction { timestamp: 0 });
        let mut b = Action::new(2, "g1");
        b.parent_action_id = Some(1);
        b.children.insert(3, ActionInteraction { timestamp: 0 });
        let mut c = Action::new(3, "g1");
        c.parent_action_id = Some(2);
        let actions = BTreeMap::from([(1, a), (2, b), (3, c)]);
        StaticGraph::new(header, actions, BTreeMap::new())
    }

    #[test]
    fn subgraph_restricts_to_reachable_and_erases_dangling_parent() {
        let source = chain();
        let restricted = subgraph(&source, &Cancel::new(), &[2]).unwrap();
        let mut ids = restricted.action_ids();
        ids.sort_unstable();
        assert_eq!(ids, vec![2, 3]);
        let b = restricted.action(2).unwrap();
        assert!(b.parent_action_id.is_none());
        assert_eq!(restricted.entry_point_action_ids(), vec![2]);
    }

    #[test]
    fn subgraph_for_roots_drops_roots_reachable_from_others() {
        let source = chain();
        let restricted = subgraph_for_roots(&source, &Cancel::new(), &[1, 2]).unwrap();
        let mut ids = restricted.action_ids();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(restricted.entry_point_action_ids(), vec![1]);
    }
}
