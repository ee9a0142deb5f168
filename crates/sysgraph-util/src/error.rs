// SPDX-License-Identifier: Apache-2.0
//! Errors shared by the utilities in this crate.

/// Errors produced by URI canonicalization, storer backends, and git clone
/// abstractions.
#[derive(Debug, thiserror::Error)]
pub enum UtilError {
    /// The URI used a scheme other than `http(s)://`.
    #[error("unsupported URI scheme: {0:?}")]
    UnsupportedUriScheme(String),
    /// The URI's host is not one of the known git hosts.
    #[error("unknown host: {0:?}")]
    UnknownHost(String),
    /// The URI did not canonicalize to exactly `host/org/repo`.
    #[error("invalid repository URI: {0:?}")]
    InvalidRepoUri(String),
    /// The requested `contains` timestamp was more than one day in the
    /// future.
    #[error("freshness timestamp too far in the future: {0}")]
    FreshnessTooFarInFuture(String),
    /// A git clone operation failed.
    #[error("git clone failed: {0}")]
    CloneFailed(String),
    /// An option combination the clone abstraction does not support.
    #[error("unsupported clone option: {0}")]
    UnsupportedCloneOption(String),
    /// Underlying storer I/O error.
    #[error("storer io error: {0}")]
    Io(#[from] std::io::Error),
}
