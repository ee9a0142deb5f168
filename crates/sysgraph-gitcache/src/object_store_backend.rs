// SPDX-License-Identifier: Apache-2.0
//! Remote object-store cache backend (`gs://bucket` addressing).

use std::io::{Cursor, Write};
use std::sync::Arc;
use std::time::SystemTime;

use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use sysgraph_util::{Storer, UtilError};
use tokio::runtime::Runtime;

use crate::backend::{CacheBackend, ServeOutcome};
use crate::error::CacheError;

/// A [`CacheBackend`] backed by any `object_store::ObjectStore`, serving
/// cache hits as a redirect to the object's public URL rather than
/// streaming them through this process.
///
/// `object_store`'s API is async; this backend owns a small dedicated
/// current-thread runtime to bridge the synchronous [`Storer`] contract,
/// the same bridging pattern `sysgraph-store`'s `RemoteFilesystem` uses.
#[derive(Clone)]
pub struct ObjectStoreBackend {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    runtime: Arc<Runtime>,
}

impl ObjectStoreBackend {
    /// Address `store` as bucket `bucket` (the part after `gs://`).
    pub fn new(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Result<Self, CacheError> {
        let runtime = Runtime::new()?;
        Ok(Self {
            store,
            bucket: bucket.into(),
            runtime: Arc::new(runtime),
        })
    }

    fn redirect_url(&self, path: &str) -> String {
        format!("https://storage.googleapis.com/{}/{path}", self.bucket)
    }
}

impl Storer for ObjectStoreBackend {
    type Writer = BufferedObjectWriter;

    fn exists(&self, path: &str) -> Result<Option<SystemTime>, UtilError> {
        let object_path = ObjectPath::from(path);
        match self.runtime.block_on(self.store.head(&object_path)) {
            Ok(meta) => Ok(Some(meta.last_modified.into())),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(UtilError::Io(std::io::Error::other(e.to_string()))),
        }
    }

    fn writer(&self, path: &str) -> Result<Self::Writer, UtilError> {
        Ok(BufferedObjectWriter {
            store: Arc::clone(&self.store),
            runtime: Arc::clone(&self.runtime),
            path: path.to_string(),
            buffer: Vec::new(),
        })
    }

    fn delete(&self, path: &str) -> Result<(), UtilError> {
        let object_path = ObjectPath::from(path);
        match self.runtime.block_on(self.store.delete(&object_path)) {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(UtilError::Io(std::io::Error::other(e.to_string()))),
        }
    }
}

impl CacheBackend for ObjectStoreBackend {
    type Reader = Cursor<Vec<u8>>;

    fn serve(&self, path: &str) -> Result<ServeOutcome<Self::Reader>, CacheError> {
        Ok(ServeOutcome::Redirect(self.redirect_url(path)))
    }
}

/// Buffers a cache entry's bytes in memory and uploads them to the object
/// store as a single `put` on drop, mirroring `RemoteEntryWriter` in
/// `sysgraph-store`.
pub struct BufferedObjectWriter {
    store: Arc<dyn ObjectStore>,
    runtime: Arc<Runtime>,
    path: String,
    buffer: Vec<u8>,
}

impl Write for BufferedObjectWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Drop for BufferedObjectWriter {
    fn drop(&mut self) {
        let object_path = ObjectPath::from(self.path.as_str());
        let payload = object_store::PutPayload::from(std::mem::take(&mut self.buffer));
        let _ = self.runtime.block_on(self.store.put(&object_path, payload));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;

    fn backend() -> ObjectStoreBackend {
        ObjectStoreBackend::new(Arc::new(InMemory::new()), "my-bucket").unwrap()
    }

    #[test]
    fn absent_entry_reports_none() {
        let backend = backend();
        assert!(backend.exists("a/b/repo.tgz").unwrap().is_none());
    }

    #[test]
    fn write_then_exists_reports_a_time() {
        let backend = backend();
        backend.writer("a/b/repo.tgz").unwrap().write_all(b"hello").unwrap();
        assert!(backend.exists("a/b/repo.tgz").unwrap().is_some());
    }

    #[test]
    fn serve_is_always_a_redirect() {
        let backend = backend();
        match backend.serve("a/b/repo.tgz").unwrap() {
            ServeOutcome::Redirect(url) => assert!(url.contains("my-bucket")),
            ServeOutcome::Stream(_) => panic!("object-store backend must redirect, not stream"),
        }
    }
}
