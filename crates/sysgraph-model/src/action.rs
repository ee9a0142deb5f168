// SPDX-License-Identifier: Apache-2.0
//! The graph's vertex: an observed process execution and its recorded
//! interactions with resources and its parent/children.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sysgraph_digest::Digest;

/// A single recorded touch of a resource by an action (read or write).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceInteraction {
    /// When the interaction was observed.
    pub timestamp: i64,
    /// Optional byte-count detail.
    pub io_info: Option<IoInfo>,
}

/// Byte-count detail attached to a [`ResourceInteraction`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct IoInfo {
    /// Number of bytes transferred in this interaction.
    pub bytes_used: u64,
}

/// A parent→child or child→parent edge timestamp.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionInteraction {
    /// When the relationship was observed (e.g. fork/child-announce time).
    pub timestamp: i64,
}

/// The command line and related static exec-time metadata of an action.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExecInfo {
    /// Argument vector, `argv[0]` included.
    pub argv: Vec<String>,
}

impl ExecInfo {
    /// Digest this exec info for use as a deterministic-ordering sort key
    /// component (see `sysgraph-transform`'s `Deterministic` view).
    pub fn digest(&self) -> Digest {
        Digest::of_record(self).unwrap_or_else(|_| Digest::empty())
    }
}

/// An observed process execution plus its recorded interactions.
///
/// Ordering within `children`/`inputs`/`outputs` is a `BTreeMap`, so
/// iteration is always by key — ascending action id for children, ascending
/// digest string for resources — giving every reader of an `Action`
/// deterministic iteration without a separate sort step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Action {
    /// Dense id assigned by the graph builder; `> 0`, unique within a graph.
    pub id: i64,
    /// Identity of the parent graph this action belongs to.
    pub sysgraph_id: String,
    /// Observed start time.
    pub start_time: i64,
    /// Observed end time.
    pub end_time: i64,
    /// Command line and related exec-time metadata.
    pub exec_info: ExecInfo,
    /// Digest of the resource describing the executable binary, if known.
    pub executable_resource_digest: Option<Digest>,
    /// Interaction record for reading the executable, if known.
    pub executable: Option<ResourceInteraction>,
    /// Id of the parent action, if any (entry points have none).
    pub parent_action_id: Option<i64>,
    /// Interaction record for the parent→child relationship, if any.
    pub parent: Option<ActionInteraction>,
    /// Child action id → the child-announce interaction.
    pub children: BTreeMap<i64, ActionInteraction>,
    /// Resource digest (canonical string) → ordered interactions, for
    /// resources this action read.
    pub inputs: BTreeMap<String, Vec<ResourceInteraction>>,
    /// Resource digest (canonical string) → ordered interactions, for
    /// resources this action wrote.
    pub outputs: BTreeMap<String, Vec<ResourceInteraction>>,
    /// Free-form key/value metadata; well-known key `risky_pipe = "true"`.
    pub metadata: BTreeMap<String, String>,
    /// Exit signal name, empty string if the action exited normally.
    pub exit_signal: String,
    /// Process exit status.
    pub exit_status: u32,
}

impl Action {
    /// Construct a bare action record for the given dense id, with all
    /// optional/collection fields empty. Callers (the graph builder) fill
    /// in the rest as they project IR events.
    pub fn new(id: i64, sysgraph_id: impl Into<String>) -> Self {
        Self {
            id,
            sysgraph_id: sysgraph_id.into(),
            start_time: 0,
            end_time: 0,
            exec_info: ExecInfo::default(),
            executable_resource_digest: None,
            executable: None,
            parent_action_id: None,
            parent: None,
            children: BTreeMap::new(),
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
            metadata: BTreeMap::new(),
            exit_signal: String::new(),
            exit_status: 0,
        }
    }

    /// `true` if this action's metadata marks it as a risky pipe parent.
    pub fn is_risky_pipe(&self) -> bool {
        self.metadata
            .get(crate::RISKY_PIPE_KEY)
            .is_some_and(|v| v == crate::RISKY_PIPE_TRUE)
    }

    /// Mark this action as a risky pipe parent.
    pub fn mark_risky_pipe(&mut self) {
        self.metadata
            .insert(crate::RISKY_PIPE_KEY.to_string(), crate::RISKY_PIPE_TRUE.to_string());
    }

    /// `true` if this action exited abnormally (non-zero status or a
    /// non-empty signal name).
    pub fn is_abnormal_exit(&self) -> bool {
        self.exit_status != 0 || !self.exit_signal.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn new_action_has_no_parent_and_is_entry_point_shaped() {
        let a = Action::new(1, "g1");
        assert!(a.parent_action_id.is_none());
        assert!(a.children.is_empty());
    }

    #[test]
    fn risky_pipe_round_trip() {
        let mut a = Action::new(1, "g1");
        assert!(!a.is_risky_pipe());
        a.mark_risky_pipe();
        assert!(a.is_risky_pipe());
    }

    #[test]
    fn abnormal_exit_detection() {
        let mut a = Action::new(1, "g1");
        assert!(!a.is_abnormal_exit());
        a.exit_status = 1;
        assert!(a.is_abnormal_exit());
        a.exit_status = 0;
        a.exit_signal = "SIGKILL".into();
        assert!(a.is_abnormal_exit());
    }
}
