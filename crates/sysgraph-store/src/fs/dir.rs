// SPDX-License-Identifier: Apache-2.0
//! Plain local-directory filesystem backend.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::fs::Filesystem;

/// A [`Filesystem`] rooted at a local directory.
pub struct DirFilesystem {
    root: PathBuf,
}

impl DirFilesystem {
    /// Root the filesystem at `root`. Does not require `root` to exist yet.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    fn io_err(path: &Path, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl Filesystem for DirFilesystem {
    fn mkdir_all(&self, path: &str) -> Result<(), StoreError> {
        let full = self.resolve(path);
        fs::create_dir_all(&full).map_err(|e| Self::io_err(&full, e))
    }

    fn write_file(&self, path: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|e| Self::io_err(parent, e))?;
        }
        fs::write(&full, bytes).map_err(|e| Self::io_err(&full, e))
    }

    fn file_writer(&self, path: &str) -> Result<Box<dyn Write + Send + '_>, StoreError> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|e| Self::io_err(parent, e))?;
        }
        let file = fs::File::create(&full).map_err(|e| Self::io_err(&full, e))?;
        Ok(Box::new(file))
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>, StoreError> {
        let full = self.resolve(path);
        fs::read(&full).map_err(|e| Self::io_err(&full, e))
    }

    fn exists(&self, path: &str) -> Result<bool, StoreError> {
        Ok(self.resolve(path).exists())
    }

    fn list_dir(&self, path: &str) -> Result<Vec<String>, StoreError> {
        let full = self.resolve(path);
        if !full.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&full).map_err(|e| Self::io_err(&full, e))? {
            let entry = entry.map_err(|e| Self::io_err(&full, e))?;
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let fsys = DirFilesystem::new(dir.path());
        fsys.write_file("a/b.txt", b"hello").unwrap();
        assert_eq!(fsys.read_file("a/b.txt").unwrap(), b"hello");
        assert!(fsys.exists("a/b.txt").unwrap());
        assert!(!fsys.exists("a/missing.txt").unwrap());
    }

    #[test]
    fn list_dir_on_missing_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let fsys = DirFilesystem::new(dir.path());
        assert!(fsys.list_dir("nope").unwrap().is_empty());
    }

    #[test]
    fn streaming_writer_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let fsys = DirFilesystem::new(dir.path());
        {
            let mut w = fsys.file_writer("stream.bin").unwrap();
            w.write_all(b"streamed").unwrap();
        }
        assert_eq!(fsys.read_file("stream.bin").unwrap(), b"streamed");
    }
}
