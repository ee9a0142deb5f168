// SPDX-License-Identifier: Apache-2.0
//! `Merge`: sequential concatenation of graphs into one, densifying each
//! subgraph's ids by cumulative offset.

use std::collections::BTreeMap;

use sysgraph_model::SysGraphHeader;
use sysgraph_query::{ActionProvider, ActionResourceProvider};
use sysgraph_util::Cancel;

use crate::error::TransformError;
use crate::graph::{GraphSource, StaticGraph};
use crate::remap::{dense_mapping, remap_action};

/// Concatenate `graphs` in order into one graph named `new_id`. Subgraph
/// `i` is densified starting at `1 + Σ|subgraph_j|` for `j < i`. Resource
/// digests are unioned; a digest already contributed by an earlier
/// subgraph is kept as-is. Merged actions carry `sysgraph_id = new_id`.
pub fn merge<P>(new_id: impl Into<String>, graphs: &[&P], cancel: &Cancel) -> Result<StaticGraph, TransformError>
where
    P: GraphSource + ?Sized,
{
    let new_id = new_id.into();
    let mut actions = BTreeMap::new();
    let mut resources = BTreeMap::new();
    let mut entry_points = Vec::new();
    let mut offset = 0_i64;

    for graph in graphs {
        if cancel.is_cancelled() {
            return Err(TransformError::Cancelled);
        }
        let mut ids = graph.action_ids();
        let mapping = dense_mapping(&mut ids, offset + 1);

        for &orig in &ids {
            let action = graph.action(orig).ok_or(TransformError::ActionNotFound(orig))?;
            let mut action = remap_action(action, &mapping);
            action.sysgraph_id = new_id.clone();
            actions.insert(action.id, action);
        }

        for digest_key in graph.resource_digests() {
            if !resources.contains_key(&digest_key) {
                if let Some(resource) = graph.resource(&digest_key) {
                    resources.insert(digest_key, resource);
                }
            }
        }

        let header = graph.header();
        entry_points.extend(header.entry_point_action_ids.iter().filter_map(|id| mapping.get(id).copied()));

        offset += ids.len() as i64;
    }

    entry_points.sort_unstable();
    let mut header = SysGraphHeader::new(new_id);
    header.entry_point_action_ids = entry_points;
    Ok(StaticGraph::new(header, actions, resources))
}
