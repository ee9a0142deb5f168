// SPDX-License-Identifier: Apache-2.0
//! Composite graphs: a base directory whose header names an ordered list of
//! subgraphs, each a complete flat graph of its own. Loading stitches their
//! id spaces together by cumulative offset.

use sysgraph_model::{ResourceDb, SysGraphHeader};

use crate::error::StoreError;
use crate::fs::Filesystem;
use crate::layout::{count_actions, read_action, read_header, read_rdb};

/// The id range `(offset, offset + count]` a subgraph occupies in the
/// composite id space, along with its directory name.
#[derive(Debug, Clone)]
struct SubgraphBound {
    subdir: String,
    offset: i64,
    count: i64,
}

/// A composite graph: the union of an ordered sequence of subgraphs,
/// presented under one contiguous id space.
pub struct CompositeGraph {
    /// The composite header: its `entry_point_action_ids` are the union of
    /// every subgraph's entry points, rewritten into the composite id space.
    pub header: SysGraphHeader,
    /// The union of every subgraph's resource DB.
    pub rdb: ResourceDb,
    bounds: Vec<SubgraphBound>,
}

impl CompositeGraph {
    /// Load the composite graph rooted at `fsys`. The base graph (at the
    /// filesystem root) must declare subgraphs in its header and must
    /// itself contain no actions of its own.
    pub fn load(fsys: &dyn Filesystem) -> Result<Self, StoreError> {
        let base_header = read_header(fsys, "")?;
        let base_action_count = count_actions(fsys, "")?;
        if base_action_count > 0 {
            return Err(StoreError::CompositeBaseHasActions(base_action_count));
        }

        let mut bounds = Vec::with_capacity(base_header.subgraphs.len());
        let mut rdb = ResourceDb::new();
        let mut entry_points = Vec::new();
        let mut offset = 0_i64;

        for subdir in &base_header.subgraphs {
            let sub_header = read_header(fsys, subdir)?;
            let sub_rdb = read_rdb(fsys, subdir)?;
            rdb.merge(sub_rdb);

            let count = i64::try_from(count_actions(fsys, subdir)?).unwrap_or(i64::MAX);
            for entry_point in &sub_header.entry_point_action_ids {
                entry_points.push(entry_point + offset);
            }

            bounds.push(SubgraphBound {
                subdir: subdir.clone(),
                offset,
                count,
            });
            offset += count;
        }

        entry_points.sort_unstable();
        let mut header = base_header;
        header.entry_point_action_ids = entry_points;

        Ok(Self { header, rdb, bounds })
    }

    /// Every action id present in the composite id space, in ascending
    /// order.
    pub fn action_ids(&self) -> Vec<i64> {
        let mut ids = Vec::new();
        for bound in &self.bounds {
            ids.extend((1..=bound.count).map(|local| bound.offset + local));
        }
        ids
    }

    /// Read the action at composite id `global_id`, with its own id, parent
    /// id, and child ids rewritten into the composite space.
    ///
    /// The owning subgraph is the one whose range `(offset, offset + count]`
    /// strictly contains `global_id` — a boundary id at the top of one
    /// subgraph's range belongs to that subgraph, never to the start of the
    /// next.
    pub fn action(&self, fsys: &dyn Filesystem, global_id: i64) -> Result<sysgraph_model::Action, StoreError> {
        let bound = self
            .bounds
            .iter()
            .find(|b| global_id > b.offset && global_id <= b.offset + b.count)
            .ok_or(StoreError::ActionNotFound(global_id))?;

        let local_id = global_id - bound.offset;
        let mut action = read_action(fsys, &bound.subdir, local_id)?;
        action.id = global_id;
        action.parent_action_id = action.parent_action_id.map(|parent| parent + bound.offset);
        let children = std::mem::take(&mut action.children);
        action.children = children
            .into_iter()
            .map(|(child_id, interaction)| (child_id + bound.offset, interaction))
            .collect();
        Ok(action)
    }
}
