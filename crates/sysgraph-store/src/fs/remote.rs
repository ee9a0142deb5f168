// SPDX-License-Identifier: Apache-2.0
//! Remote object-store filesystem backend, covering both directory-prefix
//! and single-archive remote modes.

use std::io::Write;
use std::sync::Arc;

use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use tokio::runtime::Runtime;

use crate::error::StoreError;
use crate::fs::Filesystem;

/// A [`Filesystem`] backed by any `object_store::ObjectStore`.
///
/// `object_store`'s API is async; this backend owns a small dedicated
/// current-thread runtime to bridge the synchronous [`Filesystem`] contract
/// every other backend shares, the same way a batch build pipeline with no
/// surrounding async context would.
pub struct RemoteFilesystem {
    store: Arc<dyn ObjectStore>,
    prefix: String,
    runtime: Runtime,
}

impl RemoteFilesystem {
    /// Root the filesystem at `prefix` within `store` (e.g. a directory
    /// prefix, or the single path a remote-archive mode addresses).
    pub fn new(store: Arc<dyn ObjectStore>, prefix: impl Into<String>) -> Result<Self, StoreError> {
        let runtime = Runtime::new().map_err(|e| StoreError::ObjectStore(e.to_string()))?;
        Ok(Self {
            store,
            prefix: prefix.into(),
            runtime,
        })
    }

    fn object_path(&self, path: &str) -> ObjectPath {
        if self.prefix.is_empty() {
            ObjectPath::from(path)
        } else {
            ObjectPath::from(format!("{}/{path}", self.prefix.trim_end_matches('/')))
        }
    }
}

impl Filesystem for RemoteFilesystem {
    fn mkdir_all(&self, _path: &str) -> Result<(), StoreError> {
        // Object stores have no directory concept; keys imply structure.
        Ok(())
    }

    fn write_file(&self, path: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let object_path = self.object_path(path);
        let payload = object_store::PutPayload::from(bytes.to_vec());
        self.runtime
            .block_on(self.store.put(&object_path, payload))
            .map_err(|e| StoreError::ObjectStore(e.to_string()))?;
        Ok(())
    }

    fn file_writer(&self, path: &str) -> Result<Box<dyn Write + Send + '_>, StoreError> {
        Ok(Box::new(RemoteEntryWriter {
            fsys: self,
            path: path.to_string(),
            buffer: Vec::new(),
        }))
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>, StoreError> {
        let object_path = self.object_path(path);
        let result = self
            .runtime
            .block_on(self.store.get(&object_path))
            .map_err(|e| StoreError::ObjectStore(e.to_string()))?;
        let bytes = self
            .runtime
            .block_on(result.bytes())
            .map_err(|e| StoreError::ObjectStore(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    fn exists(&self, path: &str) -> Result<bool, StoreError> {
        let object_path = self.object_path(path);
        match self.runtime.block_on(self.store.head(&object_path)) {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(StoreError::ObjectStore(e.to_string())),
        }
    }

    fn list_dir(&self, path: &str) -> Result<Vec<String>, StoreError> {
        use futures::stream::StreamExt;
        let object_path = self.object_path(path);
        let mut names = Vec::new();
        self.runtime.block_on(async {
            let mut stream = self.store.list(Some(&object_path));
            while let Some(Ok(meta)) = stream.next().await {
                if let Some(name) = meta.location.filename() {
                    names.push(name.to_string());
                }
            }
        });
        Ok(names)
    }
}

struct RemoteEntryWriter<'a> {
    fsys: &'a RemoteFilesystem,
    path: String,
    buffer: Vec<u8>,
}

impl Write for RemoteEntryWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Drop for RemoteEntryWriter<'_> {
    fn drop(&mut self) {
        let _ = self.fsys.write_file(&self.path, &self.buffer);
    }
}
