// SPDX-License-Identifier: Apache-2.0
//! Errors produced by the git-cache service.

/// Errors surfaced by `sysgraph-gitcache`.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Request validation, URI canonicalization, or freshness parsing
    /// failed. Never retried; the caller supplied bad input.
    #[error("invalid request: {0}")]
    InvalidRequest(sysgraph_util::UtilError),
    /// The upstream git host rejected the clone because it requires
    /// authentication the cache has no credentials for.
    #[error("upstream authentication required: {0}")]
    AuthRequired(String),
    /// The clone failed for a reason other than missing authentication.
    #[error("git clone failed: {0}")]
    CloneFailed(String),
    /// Any other I/O failure against the backend or the staging
    /// filesystem.
    #[error("cache io error: {0}")]
    Io(#[from] std::io::Error),
    /// The configured object-store backend rejected an operation.
    #[error("object store error: {0}")]
    ObjectStore(String),
}
