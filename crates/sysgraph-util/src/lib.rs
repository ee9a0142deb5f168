// SPDX-License-Identifier: Apache-2.0
//! Shared utilities used across the SysGraph workspace: cooperative
//! cancellation, a fan-out backoff limiter, single-flight call coalescing,
//! canonical repository URI handling, and the generic storer/clone
//! abstractions the git-cache service builds on.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]

mod backoff;
mod cancel;
mod clone;
mod error;
mod freshness;
mod single_flight;
mod storer;
mod uri;

pub use backoff::BackoffLimiter;
pub use cancel::Cancel;
pub use clone::{CloneOptions, GitCloner};
pub use error::UtilError;
pub use freshness::parse_and_check_freshness;
pub use single_flight::SingleFlight;
pub use storer::Storer;
pub use uri::canonicalize_repo_uri;
