// SPDX-License-Identifier: Apache-2.0
//! The generic content-storer abstraction shared by cache-shaped backends.

use std::io::Write;
use std::time::SystemTime;

use crate::error::UtilError;

/// A pluggable storage backend addressed by slash-separated path strings.
///
/// Implemented by local-directory and remote-object-store backends in
/// `sysgraph-gitcache`; kept generic here because the shape (existence +
/// mtime check, streaming writer, tolerant delete) is reusable beyond the
/// git-cache service.
pub trait Storer: Send + Sync {
    /// A streaming writer returned by [`writer`](Storer::writer).
    type Writer: Write;

    /// The modification time of `path`, or `None` if absent.
    fn exists(&self, path: &str) -> Result<Option<SystemTime>, UtilError>;

    /// Open a streaming writer for `path`, creating parent directories as
    /// needed. Callers must finish and drop the writer to make the write
    /// visible.
    fn writer(&self, path: &str) -> Result<Self::Writer, UtilError>;

    /// Remove `path`. Tolerates an already-absent path.
    fn delete(&self, path: &str) -> Result<(), UtilError>;
}
