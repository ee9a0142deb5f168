// SPDX-License-Identifier: Apache-2.0
//! `OverrideProto`: wraps a graph with a different header, rewriting each
//! action's `sysgraph_id` to match.

use std::collections::BTreeMap;

use sysgraph_model::SysGraphHeader;
use sysgraph_query::ActionProvider;

use crate::error::TransformError;
use crate::graph::{GraphSource, StaticGraph};
use crate::remap::referenced_resources;

/// Replace `source`'s header with `new_header`, rewriting every returned
/// action's `sysgraph_id` to `new_header.id`. Action ids are untouched.
pub fn override_proto<P>(source: &P, new_header: SysGraphHeader) -> Result<StaticGraph, TransformError>
where
    P: GraphSource + ?Sized,
{
    let mut actions = BTreeMap::new();
    for id in source.action_ids() {
        let mut action = source.action(id).ok_or(TransformError::ActionNotFound(id))?;
        action.sysgraph_id = new_header.id.clone();
        actions.insert(id, action);
    }
    let resources = referenced_resources(source, &actions);
    Ok(StaticGraph::new(new_header, actions, resources))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sysgraph_model::Action;

    #[test]
    fn rewrites_sysgraph_id_and_keeps_ids() {
        let header = SysGraphHeader::new("g1");
        let actions = BTreeMap::from([(1, Action::new(1, "g1"))]);
        let source = StaticGraph::new(header, actions, BTreeMap::new());

        let overridden = override_proto(&source, SysGraphHeader::new("g2")).unwrap();
        let action = overridden.action(1).unwrap();
        assert_eq!(action.id, 1);
        assert_eq!(action.sysgraph_id, "g2");
    }
}
