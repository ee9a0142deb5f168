// SPDX-License-Identifier: Apache-2.0
//! Graph traversal: `FindFirstBFS` and `AllTransitiveDeps`.
//!
//! Both walk the child mapping. Shared mutable visited-sets make these
//! awkward to parallelize safely, and the spec doesn't ask for it, so both
//! run sequentially; only the per-action resource collection inside
//! `AllTransitiveDeps` is worth a `rayon::Scope`, and even that is a small
//! enough set per call that a plain loop reads better.

use std::collections::{HashMap, HashSet, VecDeque};

use sysgraph_model::{Action, Resource};
use sysgraph_util::Cancel;

use crate::error::QueryError;
use crate::provider::{ActionProvider, ActionResourceProvider};

/// Level-synchronous BFS from `roots` over the child mapping, visiting each
/// node at most once. Returns the first action for which `predicate` holds.
pub fn find_first_bfs<P, F>(provider: &P, cancel: &Cancel, roots: &[i64], predicate: F) -> Result<Action, QueryError>
where
    P: ActionProvider + ?Sized,
    F: Fn(&Action) -> bool,
{
    let mut visited: HashSet<i64> = roots.iter().copied().collect();
    let mut frontier: VecDeque<i64> = roots.iter().copied().collect();

    while let Some(id) = frontier.pop_front() {
        if cancel.is_cancelled() {
            return Err(QueryError::Cancelled);
        }
        let action = provider.action(id).ok_or(QueryError::ActionNotFound(id))?;
        if predicate(&action) {
            return Ok(action);
        }
        for &child_id in action.children.keys() {
            if visited.insert(child_id) {
                frontier.push_back(child_id);
            }
        }
    }

    Err(QueryError::NoMatch)
}

pub(crate) fn visited_set<P>(provider: &P, root: i64) -> Result<HashSet<i64>, QueryError>
where
    P: ActionProvider + ?Sized,
{
    let mut visited = HashSet::new();
    visited.insert(root);
    let mut frontier = VecDeque::from([root]);
    while let Some(id) = frontier.pop_front() {
        let action = provider.action(id).ok_or(QueryError::ActionNotFound(id))?;
        for &child_id in action.children.keys() {
            if visited.insert(child_id) {
                frontier.push_back(child_id);
            }
        }
    }
    Ok(visited)
}

fn post_order<P>(
    provider: &P,
    id: i64,
    visited: &HashSet<i64>,
    emitted: &mut HashSet<i64>,
    order: &mut Vec<i64>,
) -> Result<(), QueryError>
where
    P: ActionProvider + ?Sized,
{
    if emitted.contains(&id) {
        return Ok(());
    }
    let action = provider.action(id).ok_or(QueryError::ActionNotFound(id))?;
    for &child_id in action.children.keys() {
        if visited.contains(&child_id) {
            post_order(provider, child_id, visited, emitted, order)?;
        }
    }
    emitted.insert(id);
    order.push(id);
    Ok(())
}

/// For each requested id, compute the closure under child edges and collect
/// the resources (inputs, outputs, executable) touched by every action in
/// that closure. The action list is in post-order DFS order over the
/// BFS-visited set — children before parents.
pub fn all_transitive_deps<P>(
    provider: &P,
    cancel: &Cancel,
    ids: &[i64],
) -> Result<HashMap<i64, (Vec<Action>, Vec<Resource>)>, QueryError>
where
    P: ActionResourceProvider + ?Sized,
{
    let mut out = HashMap::with_capacity(ids.len());
    for &root in ids {
        if cancel.is_cancelled() {
            return Err(QueryError::Cancelled);
        }
        let visited = visited_set(provider, root)?;
        let mut order = Vec::with_capacity(visited.len());
        let mut emitted = HashSet::with_capacity(visited.len());
        post_order(provider, root, &visited, &mut emitted, &mut order)?;

        let mut actions = Vec::with_capacity(order.len());
        let mut resources = Vec::new();
        let mut seen_digests = HashSet::new();
        for id in order {
            let action = provider.action(id).ok_or(QueryError::ActionNotFound(id))?;
            for digest_key in action.inputs.keys().chain(action.outputs.keys()) {
                if seen_digests.insert(digest_key.clone()) {
                    if let Some(resource) = provider.resource(digest_key) {
                        resources.push(resource);
                    }
                }
            }
            if let Some(exec_digest) = &action.executable_resource_digest {
                let key = exec_digest.canonical();
                if seen_digests.insert(key.clone()) {
                    if let Some(resource) = provider.resource(&key) {
                        resources.push(resource);
                    }
                }
            }
            actions.push(action);
        }
        out.insert(root, (actions, resources));
    }
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sysgraph_model::ActionInteraction;

    struct FakeProvider {
        actions: HashMap<i64, Action>,
    }

    impl ActionProvider for FakeProvider {
        fn action_ids(&self) -> Vec<i64> {
            self.actions.keys().copied().collect()
        }
        fn action(&self, id: i64) -> Option<Action> {
            self.actions.get(&id).cloned()
        }
        fn entry_point_action_ids(&self) -> Vec<i64> {
            self.actions
                .values()
                .filter(|a| a.parent_action_id.is_none())
                .map(|a| a.id)
                .collect()
        }
    }

    impl ActionResourceProvider for FakeProvider {
        fn resource(&self, _digest_key: &str) -> Option<Resource> {
            None
        }
    }

    fn chain(ids: &[i64]) -> FakeProvider {
        let mut actions: HashMap<i64, Action> = ids.iter().map(|&id| (id, Action::new(id, "g1"))).collect();
        for w in ids.windows(2) {
            let (parent, child) = (w[0], w[1]);
            actions.get_mut(&parent).unwrap().children.insert(child, ActionInteraction { timestamp: 0 });
            actions.get_mut(&child).unwrap().parent_action_id = Some(parent);
        }
        FakeProvider { actions }
    }

    #[test]
    fn find_first_bfs_finds_match() {
        let p = chain(&[1, 2, 3]);
        let found = find_first_bfs(&p, &Cancel::new(), &[1], |a| a.id == 3).unwrap();
        assert_eq!(found.id, 3);
    }

    #[test]
    fn find_first_bfs_reports_no_match() {
        let p = chain(&[1, 2, 3]);
        let err = find_first_bfs(&p, &Cancel::new(), &[1], |a| a.id == 99).unwrap_err();
        assert!(matches!(err, QueryError::NoMatch));
    }

    #[test]
    fn all_transitive_deps_is_post_order() {
        let p = chain(&[1, 2, 3]);
        let result = all_transitive_deps(&p, &Cancel::new(), &[1]).unwrap();
        let (actions, _) = &result[&1];
        let order: Vec<i64> = actions.iter().map(|a| a.id).collect();
        assert_eq!(order, vec![3, 2, 1]);
    }
}
