// SPDX-License-Identifier: Apache-2.0
//! The cache backend abstraction: storage plus how to serve a cached entry
//! back to an HTTP caller.

use std::io::Read;

use sysgraph_util::Storer;

use crate::error::CacheError;

/// How a [`CacheBackend`] wants a cache hit served.
pub enum ServeOutcome<R> {
    /// Stream these bytes back with a `200`, as a local-filesystem backend
    /// does.
    Stream(R),
    /// Redirect the caller to this URL with a `302`, as an object-store
    /// backend does.
    Redirect(String),
}

/// A [`Storer`] that can also serve a cached entry directly, without the
/// caller having to know whether the entry lives on local disk or in a
/// remote object store.
pub trait CacheBackend: Storer {
    /// A reader streaming a cache entry's bytes, for [`ServeOutcome::Stream`].
    type Reader: Read;

    /// Produce how `path` should be served. Callers must have already
    /// confirmed the entry exists (e.g. via [`Storer::exists`]).
    fn serve(&self, path: &str) -> Result<ServeOutcome<Self::Reader>, CacheError>;
}
