// SPDX-License-Identifier: Apache-2.0
//! Errors produced by query operations.

/// Errors surfaced by `sysgraph-query`.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// Requested an action id the provider has no record for.
    #[error("action {0} not found")]
    ActionNotFound(i64),
    /// `FindFirstBFS` visited every reachable node without a predicate
    /// match.
    #[error("no action matched the search predicate")]
    NoMatch,
    /// The operation's cancellation handle was signalled mid-flight.
    #[error("query cancelled")]
    Cancelled,
}
