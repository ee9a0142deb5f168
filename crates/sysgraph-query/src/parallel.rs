// SPDX-License-Identifier: Apache-2.0
//! Parallel application over the action set: `MapAll`, `Filter`, `Range`,
//! `MapSome`. All four check `cancel` before touching each action, so a
//! cancelled handle aborts the remaining work at its next suspension point
//! instead of running to completion.

use rayon::prelude::*;
use sysgraph_model::Action;
use sysgraph_util::Cancel;

use crate::error::QueryError;
use crate::provider::ActionProvider;

fn lookup(provider: &(impl ActionProvider + ?Sized), cancel: &Cancel, id: i64) -> Result<Action, QueryError> {
    if cancel.is_cancelled() {
        return Err(QueryError::Cancelled);
    }
    provider.action(id).ok_or(QueryError::ActionNotFound(id))
}

/// Apply `f` to every action in the graph, in parallel.
pub fn map_all<P, T, F>(provider: &P, cancel: &Cancel, f: F) -> Result<Vec<T>, QueryError>
where
    P: ActionProvider + ?Sized,
    T: Send,
    F: Fn(&Action) -> T + Sync,
{
    provider
        .action_ids()
        .into_par_iter()
        .map(|id| lookup(provider, cancel, id).map(|action| f(&action)))
        .collect()
}

/// Return every action for which `predicate` holds, in parallel.
pub fn filter<P, F>(provider: &P, cancel: &Cancel, predicate: F) -> Result<Vec<Action>, QueryError>
where
    P: ActionProvider + ?Sized,
    F: Fn(&Action) -> bool + Sync,
{
    provider
        .action_ids()
        .into_par_iter()
        .filter_map(|id| match lookup(provider, cancel, id) {
            Ok(action) if predicate(&action) => Some(Ok(action)),
            Ok(_) => None,
            Err(e) => Some(Err(e)),
        })
        .collect()
}

/// Apply `f` to every action whose id falls in `[start, end)`, in parallel.
pub fn range<P, T, F>(provider: &P, cancel: &Cancel, start: i64, end: i64, f: F) -> Result<Vec<T>, QueryError>
where
    P: ActionProvider + ?Sized,
    T: Send,
    F: Fn(&Action) -> T + Sync,
{
    provider
        .action_ids()
        .into_iter()
        .filter(|id| *id >= start && *id < end)
        .collect::<Vec<_>>()
        .into_par_iter()
        .map(|id| lookup(provider, cancel, id).map(|action| f(&action)))
        .collect()
}

/// Apply `f` to exactly the actions named by `ids`, in parallel.
pub fn map_some<P, T, F>(provider: &P, cancel: &Cancel, ids: &[i64], f: F) -> Result<Vec<T>, QueryError>
where
    P: ActionProvider + ?Sized,
    T: Send,
    F: Fn(&Action) -> T + Sync,
{
    ids.par_iter()
        .map(|&id| lookup(provider, cancel, id).map(|action| f(&action)))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::provider::ActionResourceProvider;
    use std::collections::HashMap;
    use sysgraph_model::Resource;

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

    fn provider(ids: &[i64]) -> FakeProvider {
        let actions = ids.iter().map(|&id| (id, Action::new(id, "g1"))).collect();
        FakeProvider { actions }
    }

    #[test]
    fn map_all_visits_every_action() {
        let p = provider(&[1, 2, 3]);
        let mut ids: Vec<i64> = map_all(&p, &Cancel::new(), |a| a.id).unwrap();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn filter_keeps_only_matches() {
        let p = provider(&[1, 2, 3, 4]);
        let mut ids: Vec<i64> = filter(&p, &Cancel::new(), |a| a.id % 2 == 0)
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![2, 4]);
    }

    #[test]
    fn range_bounds_are_half_open() {
        let p = provider(&[1, 2, 3, 4, 5]);
        let mut ids: Vec<i64> = range(&p, &Cancel::new(), 2, 4, |a| a.id).unwrap();
        ids.sort_unstable();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn map_some_rejects_unknown_id() {
        let p = provider(&[1, 2]);
        let err = map_some(&p, &Cancel::new(), &[1, 99], |a| a.id).unwrap_err();
        assert!(matches!(err, QueryError::ActionNotFound(99)));
    }

    #[test]
    fn cancelled_handle_aborts() {
        let p = provider(&[1, 2, 3]);
        let cancel = Cancel::new();
        cancel.cancel();
        let err = map_all(&p, &cancel, |a| a.id).unwrap_err();
        assert!(matches!(err, QueryError::Cancelled));
    }
}
