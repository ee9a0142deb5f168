// SPDX-License-Identifier: Apache-2.0
//! Compiles an IR event stream into a normalized SysGraph action graph.
//!
//! The five phases run strictly in order — ID assignment, parallel parent/
//! pipe scan, risky-pipe detection, action assembly, finalize — with no
//! action record emitted before phases 1 through 3 complete, per the
//! concurrency model this builder implements.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]

mod builder;
mod error;
mod types;

pub use builder::build;
pub use error::BuildError;
pub use types::{BuildConcurrency, BuildOptions, BuiltGraph};
