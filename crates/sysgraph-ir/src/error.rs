// SPDX-License-Identifier: Apache-2.0
//! Errors produced by IR store backends.

use std::path::PathBuf;

/// Errors surfaced while writing or reading IR events.
#[derive(Debug, thiserror::Error)]
pub enum IrError {
    /// The given action id is not known to this store.
    #[error("unknown action id: {0:?}")]
    UnknownAction(String),
    /// An action id contained a path separator, which is forbidden because
    /// IDs are used verbatim as on-disk filenames.
    #[error("action id {0:?} contains a path separator")]
    IdContainsPathSeparator(String),
    /// The on-disk file extension did not match either supported format.
    #[error("unrecognized IR record format for file {0:?}")]
    UnknownFormat(PathBuf),
    /// A length-prefixed binary record was truncated or malformed.
    #[error("malformed length-delimited record in {path:?}: {reason}")]
    MalformedRecord {
        /// File the record was read from.
        path: PathBuf,
        /// Human-readable description of the malformation.
        reason: String,
    },
    /// JSON (de)serialization failure.
    #[error("JSON error in {path:?}: {source}")]
    Json {
        /// File the error occurred in.
        path: PathBuf,
        /// Underlying serde_json error.
        #[source]
        source: serde_json::Error,
    },
    /// Binary (de)serialization failure.
    #[error("binary encoding error in {path:?}: {source}")]
    Bincode {
        /// File the error occurred in.
        path: PathBuf,
        /// Underlying bincode error.
        #[source]
        source: bincode::Error,
    },
    /// Underlying filesystem I/O error.
    #[error("io error at {path:?}: {source}")]
    Io {
        /// Path the error occurred at.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
