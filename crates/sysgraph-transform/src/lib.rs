// SPDX-License-Identifier: Apache-2.0
//! Read-only views over a SysGraph action graph: renumbering, subgraph
//! restriction, deterministic canonicalization, merging, and header
//! overrides. Each view materializes into a [`StaticGraph`], which in turn
//! implements `sysgraph_query`'s provider traits so that every query
//! operation runs unchanged over a view's output.

#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]

mod dense;
mod deterministic;
mod error;
mod filter_root;
mod graph;
mod merge;
mod override_proto;
mod remap;
mod subgraph;

pub use dense::{dense, DenseView};
pub use deterministic::deterministic;
pub use error::TransformError;
pub use filter_root::filter_for_root;
pub use graph::{GraphSource, StaticGraph};
pub use merge::merge;
pub use override_proto::override_proto;
pub use subgraph::{subgraph, subgraph_for_roots};
