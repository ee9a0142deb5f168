// SPDX-License-Identifier: Apache-2.0
//! `FilterForRoot`: BFS from the original entry points to the first
//! predicate match, producing a subgraph rooted there and densified from 1.

use sysgraph_model::Action;
use sysgraph_query::QueryError;
use sysgraph_util::Cancel;

use crate::error::TransformError;
use crate::graph::{GraphSource, StaticGraph};
use crate::subgraph::subgraph;

fn map_query_err(err: QueryError) -> TransformError {
    match err {
        QueryError::Cancelled => TransformError::Cancelled,
        QueryError::ActionNotFound(id) => TransformError::ActionNotFound(id),
        QueryError::NoMatch => TransformError::NoMatch,
    }
}

/// BFS from `source`'s entry points to the first action for which
/// `predicate` holds, then restrict to the subgraph reachable from it and
/// densify from `1`.
pub fn filter_for_root<P, F>(source: &P, cancel: &Cancel, predicate: F) -> Result<StaticGraph, TransformError>
where
    P: GraphSource + ?Sized,
    F: Fn(&Action) -> bool,
{
    let header = source.header();
    let root = sysgraph_query::find_first_bfs(source, cancel, &header.entry_point_action_ids, predicate).map_err(map_query_err)?;
    let restricted = subgraph(source, cancel, &[root.id])?;
    Ok(crate::dense::dense(&restricted, 1)?.graph)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use sysgraph_model::{ActionInteraction, SysGraphHeader};
    use sysgraph_query::ActionProvider;

    fn chain() -> StaticGraph {
        let mut header = SysGraphHeader::new("g1");
        header.entry_point_action_ids = vec![1];
        let mut a = Action::new(1, "g1");
        a.children.insert(2, ActionInteraction { timestamp: 0 });
        let mut b = Action::new(2, "g1");
        b.parent_action_id = Some(1);
        b.exec_info.argv = vec!["target".to_string()];
        let actions = BTreeMap::from([(1, a), (2, b)]);
        StaticGraph::new(header, actions, BTreeMap::new())
    }

    #[test]
    fn finds_and_densifies_from_root() {
        let source = chain();
        let result = filter_for_root(&source, &Cancel::new(), |a| a.exec_info.argv == vec!["target".to_string()]).unwrap();
        assert_eq!(result.action_ids(), vec![1]);
        assert!(result.entry_point_action_ids().contains(&1));
    }

    #[test]
    fn no_match_is_reported() {
        let source = chain();
        let err = filter_for_root(&source, &Cancel::new(), |a| a.id == 99).unwrap_err();
        assert!(matches!(err, TransformError::NoMatch));
    }
}
