// SPDX-License-Identifier: Apache-2.0
//! Read-only query operations over a SysGraph action graph.
//!
//! Every operation here is written against [`ActionProvider`] /
//! [`ActionResourceProvider`] rather than a concrete graph type —
//! `sysgraph-store::GraphReader`, a `sysgraph-transform` view, or a plain
//! in-memory map can all supply one. Parallel operations
//! ([`parallel::map_all`] and friends) are bounded by CPU count via
//! `rayon`; BFS and transitive-closure traversal run sequentially, since
//! their shared visited-sets don't parallelize safely without bookkeeping
//! the spec doesn't ask for. Every operation accepts a
//! `sysgraph_util::Cancel` handle and checks it between actions, per the
//! cooperative-cancellation model shared with the builder.

#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]

mod deps;
mod error;
mod parallel;
mod provider;
mod stats;
mod traverse;

pub use deps::{all_pipe_pairs, resource_dependencies};
pub use error::QueryError;
pub use parallel::{filter, map_all, map_some, range};
pub use provider::{ActionProvider, ActionResourceProvider};
pub use stats::{abnormal_exits, all_risky_pipes, resources_interactions};
pub use traverse::{all_transitive_deps, find_first_bfs};
