// SPDX-License-Identifier: Apache-2.0
//! The on-disk SysGraph format.
//!
//! A flat graph is a header (`graph.pb`), a resource DB (`rdb.pb`), and one
//! record per action (`a/<id>.pb`), optionally paired with a raw-event
//! sidecar (`a/<id>_raw_events.pbdelim`). A composite graph is a base
//! directory naming an ordered list of subgraphs, each a complete flat
//! graph, whose id spaces are stitched together by cumulative offset at
//! load time — see [`composite::CompositeGraph`].
//!
//! Three [`fs::Filesystem`] backends carry any of these layouts: a plain
//! directory, a single zip archive, or a remote object store.

#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]

mod composite;
mod error;
mod fs;
mod layout;
mod reader;

pub use composite::CompositeGraph;
pub use error::StoreError;
pub use fs::{DirFilesystem, Filesystem, RemoteFilesystem, ZipFilesystem};
pub use layout::{count_actions, read_action, read_header, read_rdb, write_graph};
pub use reader::GraphReader;
