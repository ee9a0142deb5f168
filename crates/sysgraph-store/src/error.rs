// SPDX-License-Identifier: Apache-2.0
//! Errors produced by the on-disk graph writer/reader.

use std::path::PathBuf;

/// Errors surfaced by `sysgraph-store`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying filesystem backend I/O error.
    #[error("io error at {path:?}: {source}")]
    Io {
        /// Path the error occurred at.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Binary (de)serialization failure.
    #[error("binary encoding error at {path:?}: {source}")]
    Bincode {
        /// Path the error occurred at.
        path: PathBuf,
        /// Underlying bincode error.
        #[source]
        source: bincode::Error,
    },
    /// JSON (de)serialization failure, for the optional auxiliary forms.
    #[error("json error at {path:?}: {source}")]
    Json {
        /// Path the error occurred at.
        path: PathBuf,
        /// Underlying serde_json error.
        #[source]
        source: serde_json::Error,
    },
    /// Zip-archive specific failure.
    #[error("zip archive error: {0}")]
    Zip(String),
    /// Remote object-store specific failure.
    #[error("object store error: {0}")]
    ObjectStore(String),
    /// An archive write buffer exceeded its size budget.
    #[error("archive entry {path:?} exceeded the {limit}-byte buffering budget")]
    ArchiveEntryTooLarge {
        /// Entry that overflowed the budget.
        path: String,
        /// The configured budget, in bytes.
        limit: usize,
    },
    /// Requested an action id that has no on-disk record.
    #[error("action {0} not found")]
    ActionNotFound(i64),
    /// Requested a resource digest that has no on-disk record.
    #[error("resource {0:?} not found")]
    ResourceNotFound(String),
    /// A composite graph's base directory contained actions of its own.
    #[error("composite graph base must contain no actions, found {0}")]
    CompositeBaseHasActions(usize),
    /// The underlying transitive dependency (`sysgraph-util`) failed.
    #[error(transparent)]
    Util(#[from] sysgraph_util::UtilError),
    /// A read coalesced onto a concurrent single-flight leader that failed;
    /// the message is the leader's error, rendered, since the original
    /// error type generally isn't `Clone`.
    #[error("cached read failed: {0}")]
    Cached(String),
}
