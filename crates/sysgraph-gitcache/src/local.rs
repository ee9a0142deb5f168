// SPDX-License-Identifier: Apache-2.0
//! Local-directory cache backend.

use std::fs::File;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::SystemTime;

use sysgraph_util::{Storer, UtilError};

use crate::backend::{CacheBackend, ServeOutcome};
use crate::error::CacheError;

/// A [`CacheBackend`] rooted at a directory on local disk.
pub struct LocalDirStorer {
    root: PathBuf,
}

impl LocalDirStorer {
    /// Root the backend at `root`, creating it if absent.
    pub fn new(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

impl Storer for LocalDirStorer {
    type Writer = File;

    fn exists(&self, path: &str) -> Result<Option<SystemTime>, UtilError> {
        match std::fs::metadata(self.full_path(path)) {
            Ok(meta) => Ok(Some(meta.modified()?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn writer(&self, path: &str) -> Result<Self::Writer, UtilError> {
        let full = self.full_path(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(File::create(full)?)
    }

    fn delete(&self, path: &str) -> Result<(), UtilError> {
        match std::fs::remove_file(self.full_path(path)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl CacheBackend for LocalDirStorer {
    type Reader = File;

    fn serve(&self, path: &str) -> Result<ServeOutcome<Self::Reader>, CacheError> {
        Ok(ServeOutcome::Stream(File::open(self.full_path(path))?))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::{Read, Write as _};

    #[test]
    fn absent_entry_reports_none() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalDirStorer::new(dir.path()).unwrap();
        assert!(backend.exists("a/b/repo.tgz").unwrap().is_none());
    }

    #[test]
    fn write_then_serve_round_trips_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalDirStorer::new(dir.path()).unwrap();
        backend.writer("a/b/repo.tgz").unwrap().write_all(b"hello").unwrap();
        assert!(backend.exists("a/b/repo.tgz").unwrap().is_some());

        let ServeOutcome::Stream(mut reader) = backend.serve("a/b/repo.tgz").unwrap() else {
            panic!("expected a stream outcome from a local backend");
        };
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn delete_tolerates_absent_path() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalDirStorer::new(dir.path()).unwrap();
        assert!(backend.delete("missing/repo.tgz").is_ok());
    }
}
