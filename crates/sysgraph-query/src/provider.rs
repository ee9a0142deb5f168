// SPDX-License-Identifier: Apache-2.0
//! The two capability traits every query operation is written against.
//!
//! Query operations never depend on a concrete graph representation —
//! `sysgraph-store::GraphReader`, a transform view, or a plain in-memory
//! map all implement these traits the same way.

use sysgraph_model::{Action, Resource};

/// Read access to an action set: which ids exist, how to look one up, and
/// which ids have no parent within the graph.
pub trait ActionProvider: Send + Sync {
    /// Every action id in the graph, in no particular order.
    fn action_ids(&self) -> Vec<i64>;

    /// Look up one action by id.
    fn action(&self, id: i64) -> Option<Action>;

    /// Ids of actions with no parent within this graph.
    fn entry_point_action_ids(&self) -> Vec<i64>;
}

/// [`ActionProvider`] plus resource lookup by digest key.
pub trait ActionResourceProvider: ActionProvider {
    /// Look up one resource by its canonical digest string.
    fn resource(&self, digest_key: &str) -> Option<Resource>;
}
