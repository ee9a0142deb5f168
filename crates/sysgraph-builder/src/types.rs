// SPDX-License-Identifier: Apache-2.0
//! Builder configuration and output types.

use sysgraph_model::{Action, ResourceDb, SysGraphHeader};

/// Bounded-concurrency knob for the parallel scan/assembly phases.
///
/// Defaults to the process-wide rayon thread count; callers needing a
/// tighter bound (e.g. to share CPU with a co-located service) can override
/// it.
#[derive(Debug, Clone, Copy)]
pub struct BuildConcurrency {
    /// Worker thread count for phases 2 and 4.
    pub threads: usize,
}

impl BuildConcurrency {
    /// Use `rayon::current_num_threads()`.
    pub fn default_concurrency() -> Self {
        Self {
            threads: rayon::current_num_threads(),
        }
    }

    /// Use an explicit thread count.
    pub fn with_threads(threads: usize) -> Self {
        Self { threads }
    }
}

impl Default for BuildConcurrency {
    fn default() -> Self {
        Self::default_concurrency()
    }
}

/// Whether to forward raw events to the on-disk writer unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Forward each action's raw events alongside its `Action` record.
    pub forward_raw_events: bool,
}

/// The in-memory result of compiling an IR into an action graph: a header,
/// a deduplicated resource database, and the assembled actions.
///
/// Persisting this to disk is `sysgraph-store`'s job — this type carries
/// everything a writer needs plus `original_ids`, which lets a caller map a
/// dense id back to the IR's original action id string, and `raw_events`,
/// populated when [`BuildOptions::forward_raw_events`] is set.
#[derive(Debug, Clone)]
pub struct BuiltGraph {
    /// The graph header (identity, metadata, entry points).
    pub header: SysGraphHeader,
    /// The deduplicated resource table.
    pub rdb: ResourceDb,
    /// Assembled actions, indexed by `dense_id - 1`.
    pub actions: Vec<Action>,
    /// Original IR action id strings, indexed by `dense_id - 1`.
    pub original_ids: Vec<String>,
    /// Raw pass-through event records for actions that have them, keyed by
    /// dense id. Empty unless `forward_raw_events` was set on the
    /// `BuildOptions` passed to [`crate::build`].
    pub raw_events: std::collections::HashMap<i64, Vec<Vec<u8>>>,
}

impl BuiltGraph {
    /// Look up an assembled action by its dense id.
    pub fn action(&self, dense_id: i64) -> Option<&Action> {
        if dense_id < 1 {
            return None;
        }
        self.actions.get((dense_id - 1) as usize)
    }

    /// Look up the original IR action id string for a dense id.
    pub fn original_id(&self, dense_id: i64) -> Option<&str> {
        if dense_id < 1 {
            return None;
        }
        self.original_ids.get((dense_id - 1) as usize).map(String::as_str)
    }
}
