// SPDX-License-Identifier: Apache-2.0
//! Errors produced while compiling an IR event stream into an action graph.

/// Errors surfaced by [`crate::build`].
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Reading the IR failed.
    #[error("IR read error: {0}")]
    Ir(#[from] sysgraph_ir::IrError),
    /// A `Dup` event carried a `new_fd` other than 0 or 1.
    #[error("action {action_id:?} recorded an invalid dup new_fd {new_fd} (must be 0 or 1)")]
    InvalidDupFd {
        /// The action whose Dup event was malformed.
        action_id: String,
        /// The offending file descriptor value.
        new_fd: i32,
    },
    /// The build was cancelled before completion.
    #[error("build cancelled")]
    Cancelled,
    /// Failed to construct the bounded-concurrency thread pool.
    #[error("failed to initialize build thread pool: {0}")]
    ThreadPoolInit(String),
}
