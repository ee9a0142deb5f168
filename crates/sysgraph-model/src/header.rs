// SPDX-License-Identifier: Apache-2.0
//! The graph-level header: identity, metadata, and entry points.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Metadata describing an entire action graph.
///
/// A flat graph has an empty `subgraphs` list; a composite graph lists the
/// ids of the subgraphs it was assembled from (see `sysgraph-store`'s
/// composite loader).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SysGraphHeader {
    /// Unique identity of this graph.
    pub id: String,
    /// Free-form key/value metadata recorded at build time.
    pub metadata: BTreeMap<String, String>,
    /// Ids of actions with no parent within this graph.
    pub entry_point_action_ids: Vec<i64>,
    /// Ids of subgraphs this graph was assembled from, in load order.
    pub subgraphs: Vec<String>,
}

impl SysGraphHeader {
    /// Construct a header for a freshly built flat graph.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            metadata: BTreeMap::new(),
            entry_point_action_ids: Vec::new(),
            subgraphs: Vec::new(),
        }
    }

    /// `true` if this header describes a composite (multi-subgraph) graph.
    pub fn is_composite(&self) -> bool {
        !self.subgraphs.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn fresh_header_is_not_composite() {
        let h = SysGraphHeader::new("g1");
        assert!(!h.is_composite());
    }

    #[test]
    fn header_with_subgraphs_is_composite() {
        let mut h = SysGraphHeader::new("g1");
        h.subgraphs.push("g0".into());
        assert!(h.is_composite());
    }
}
