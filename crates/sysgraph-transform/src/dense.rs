// SPDX-License-Identifier: Apache-2.0
//! `Dense`: bijects action ids into a contiguous range `[start, start+N)`.

use std::collections::{BTreeMap, HashMap};

use sysgraph_query::ActionProvider;

use crate::error::TransformError;
use crate::graph::{GraphSource, StaticGraph};
use crate::remap::{dense_mapping, referenced_resources, remap_action};

/// The result of [`dense`]: the densified graph plus the original→dense id
/// mapping, so callers holding original ids can translate them.
pub struct DenseView {
    /// The densified graph.
    pub graph: StaticGraph,
    mapping: HashMap<i64, i64>,
}

impl DenseView {
    /// Translate an original action id into its dense id, if present.
    pub fn dense_action_id(&self, original: i64) -> Option<i64> {
        self.mapping.get(&original).copied()
    }
}

/// Bijects `source`'s action ids into `[start, start + N)`, in ascending
/// original-id order, rewriting `id`, `parent_action_id`, child keys, and
/// entry points.
pub fn dense<P>(source: &P, start: i64) -> Result<DenseView, TransformError>
where
    P: GraphSource + ?Sized,
{
    let mut ids = source.action_ids();
    let mapping = dense_mapping(&mut ids, start);

    let mut actions = BTreeMap::new();
    for &orig in &ids {
        let action = source.action(orig).ok_or(TransformError::ActionNotFound(orig))?;
        let action = remap_action(action, &mapping);
        actions.insert(action.id, action);
    }

    let mut header = source.header();
    header.entry_point_action_ids = header
        .entry_point_action_ids
        .iter()
        .filter_map(|id| mapping.get(id).copied())
        .collect();
    header.entry_point_action_ids.sort_unstable();

    let resources = referenced_resources(source, &actions);
    Ok(DenseView {
        graph: StaticGraph::new(header, actions, resources),
        mapping,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::graph::StaticGraph;
    use sysgraph_model::{Action, ActionInteraction, SysGraphHeader};

    fn sample() -> StaticGraph {
        let mut header = SysGraphHeader::new("g1");
        header.entry_point_action_ids = vec![10];
        let mut parent = Action::new(10, "g1");
        parent.children.insert(20, ActionInteraction { timestamp: 0 });
        let mut child = Action::new(20, "g1");
        child.parent_action_id = Some(10);
        let actions = BTreeMap::from([(10, parent), (20, child)]);
        StaticGraph::new(header, actions, BTreeMap::new())
    }

    #[test]
    fn renumbers_from_start_in_ascending_order() {
        let source = sample();
        let view = dense(&source, 1).unwrap();
        assert_eq!(view.dense_action_id(10), Some(1));
        assert_eq!(view.dense_action_id(20), Some(2));
        let parent = view.graph.action(1).unwrap();
        assert_eq!(parent.children.keys().copied().collect::<Vec<_>>(), vec![2]);
        let child = view.graph.action(2).unwrap();
        assert_eq!(child.parent_action_id, Some(1));
        assert_eq!(view.graph.entry_point_action_ids(), vec![1]);
    }
}
