// SPDX-License-Identifier: Apache-2.0
//! Errors produced while building or running a pattern.

/// Errors surfaced by `sysgraph-match`.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// A `PathRegex` matcher was built from an invalid pattern.
    #[error("invalid path regex: {0}")]
    InvalidPattern(#[from] regex::Error),
}
