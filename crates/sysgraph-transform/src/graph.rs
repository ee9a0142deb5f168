// SPDX-License-Identifier: Apache-2.0
//! The materialized graph every transform view produces, and the trait
//! every transform reads its input through.

use std::collections::BTreeMap;

use sysgraph_model::{Action, Resource, SysGraphHeader};
use sysgraph_query::{ActionProvider, ActionResourceProvider};

/// Everything a transform needs from its input: action/resource lookup
/// (via `sysgraph-query`'s provider traits) plus the header and the full
/// set of resource digests, for operations (`Merge`, `Subgraph`, ...) that
/// must enumerate rather than just look up.
pub trait GraphSource: ActionProvider + ActionResourceProvider {
    /// The graph's header (identity, metadata, entry points, subgraphs).
    fn header(&self) -> SysGraphHeader;

    /// Every resource digest this graph's resource DB holds.
    fn resource_digests(&self) -> Vec<String>;
}

/// A fully materialized graph: every transform clones and rewrites records
/// into one of these rather than mutating the source.
#[derive(Debug, Clone)]
pub struct StaticGraph {
    header: SysGraphHeader,
    actions: BTreeMap<i64, Action>,
    resources: BTreeMap<String, Resource>,
}

impl StaticGraph {
    /// Build a materialized graph from its parts.
    pub fn new(header: SysGraphHeader, actions: BTreeMap<i64, Action>, resources: BTreeMap<String, Resource>) -> Self {
        Self {
            header,
            actions,
            resources,
        }
    }
}

impl ActionProvider for StaticGraph {
    fn action_ids(&self) -> Vec<i64> {
        self.actions.keys().copied().collect()
    }

    fn action(&self, id: i64) -> Option<Action> {
        self.actions.get(&id).cloned()
    }

    fn entry_point_action_ids(&self) -> Vec<i64> {
        self.header.entry_point_action_ids.clone()
    }
}

impl ActionResourceProvider for StaticGraph {
    fn resource(&self, digest_key: &str) -> Option<Resource> {
        self.resources.get(digest_key).cloned()
    }
}

impl GraphSource for StaticGraph {
    fn header(&self) -> SysGraphHeader {
        self.header.clone()
    }

    fn resource_digests(&self) -> Vec<String> {
        self.resources.keys().cloned().collect()
    }
}
