// SPDX-License-Identifier: Apache-2.0
//! Errors produced by transform views.

/// Errors surfaced by `sysgraph-transform`.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// A view referenced an action id its source has no record for.
    #[error("action {0} not found")]
    ActionNotFound(i64),
    /// `deterministic` found a cycle in the parent-edge graph while
    /// walking from action `0`.
    #[error("cyclic parent graph detected at action {0}")]
    CyclicParentGraph(i64),
    /// `filter_for_root` found no action matching its predicate.
    #[error("no action matched the filter predicate")]
    NoMatch,
    /// The operation's cancellation handle was signalled mid-flight.
    #[error("transform cancelled")]
    Cancelled,
}
