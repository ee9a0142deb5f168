// SPDX-License-Identifier: Apache-2.0
//! The action graph data model: [`Resource`], [`Action`], [`SysGraphHeader`],
//! and the resource database ([`ResourceDb`]).
//!
//! These are pure data types — construction, validation, and persistence
//! live in `sysgraph-builder` and `sysgraph-store`. Following the tagged-
//! union-over-inheritance design note, [`Resource`] is a closed
//! (`#[non_exhaustive]` for forward compatibility) enum rather than a trait
//! object hierarchy, mirroring `echo-graph`'s `WarpOp`/`NodeDataPatch` style.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]

mod action;
mod header;
mod rdb;
mod resource;

pub use action::{Action, ActionInteraction, ExecInfo, IoInfo, ResourceInteraction};
pub use header::SysGraphHeader;
pub use rdb::ResourceDb;
pub use resource::{FileType, Resource, StdIoDup};

/// Well-known action metadata key marking an action as having a risky pipe
/// topology (read/write ends held by distinct children).
pub const RISKY_PIPE_KEY: &str = "risky_pipe";
/// Value stored at [`RISKY_PIPE_KEY`] when the flag is set.
pub const RISKY_PIPE_TRUE: &str = "true";
