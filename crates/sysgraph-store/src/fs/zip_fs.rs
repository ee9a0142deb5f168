// SPDX-License-Identifier: Apache-2.0
//! Zip-archive filesystem backend.
//!
//! Zip archives admit one entry write at a time, so all writes serialize
//! behind a single lock. Streaming writers buffer their bytes in memory
//! until the writer is dropped, at which point the buffered entry is
//! flushed into the archive; an explicit size budget prevents an unbounded
//! writer from silently ballooning memory.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::Mutex;

use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::error::StoreError;
use crate::fs::Filesystem;

const DEFAULT_MAX_BUFFER_BYTES: usize = 64 * 1024 * 1024;

enum Mode {
    Write(Mutex<ZipWriter<File>>),
    Read(Mutex<ZipArchive<File>>),
}

/// A [`Filesystem`] backed by a single zip archive file.
///
/// Opened in either write mode ([`ZipFilesystem::create`]) or read mode
/// ([`ZipFilesystem::open`]) — never both, since the `zip` crate does not
/// support incremental random-access read/write on one handle.
pub struct ZipFilesystem {
    mode: Mode,
    max_buffer_bytes: usize,
}

impl ZipFilesystem {
    /// Create a new archive at `path` for writing.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            mode: Mode::Write(Mutex::new(ZipWriter::new(file))),
            max_buffer_bytes: DEFAULT_MAX_BUFFER_BYTES,
        })
    }

    /// Open an existing archive at `path` for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let archive = ZipArchive::new(file).map_err(|e| StoreError::Zip(e.to_string()))?;
        Ok(Self {
            mode: Mode::Read(Mutex::new(archive)),
            max_buffer_bytes: DEFAULT_MAX_BUFFER_BYTES,
        })
    }

    /// Override the in-memory buffering budget per streamed entry.
    pub fn with_max_buffer_bytes(mut self, max_buffer_bytes: usize) -> Self {
        self.max_buffer_bytes = max_buffer_bytes;
        self
    }

    /// Finish writing and flush the central directory. Only meaningful in
    /// write mode.
    pub fn finish(&self) -> Result<(), StoreError> {
        match &self.mode {
            Mode::Write(writer) => {
                let mut guard = writer.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                guard
                    .finish()
                    .map_err(|e| StoreError::Zip(e.to_string()))
                    .map(|_| ())
            }
            Mode::Read(_) => Ok(()),
        }
    }
}

impl Filesystem for ZipFilesystem {
    fn mkdir_all(&self, _path: &str) -> Result<(), StoreError> {
        // Zip archives need no per-member directory entries.
        Ok(())
    }

    fn write_file(&self, path: &str, bytes: &[u8]) -> Result<(), StoreError> {
        if bytes.len() > self.max_buffer_bytes {
            return Err(StoreError::ArchiveEntryTooLarge {
                path: path.to_string(),
                limit: self.max_buffer_bytes,
            });
        }
        let Mode::Write(writer) = &self.mode else {
            return Err(StoreError::Zip("archive opened read-only".to_string()));
        };
        let mut guard = writer.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        guard
            .start_file(path, SimpleFileOptions::default())
            .map_err(|e| StoreError::Zip(e.to_string()))?;
        guard.write_all(bytes).map_err(|source| StoreError::Io {
            path: path.into(),
            source,
        })
    }

    fn file_writer(&self, path: &str) -> Result<Box<dyn Write + Send + '_>, StoreError> {
        if matches!(self.mode, Mode::Read(_)) {
            return Err(StoreError::Zip("archive opened read-only".to_string()));
        }
        Ok(Box::new(ZipEntryWriter {
            fsys: self,
            path: path.to_string(),
            buffer: Vec::new(),
        }))
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>, StoreError> {
        let Mode::Read(archive) = &self.mode else {
            return Err(StoreError::Zip("archive opened write-only".to_string()));
        };
        let mut guard = archive.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut entry = guard
            .by_name(path)
            .map_err(|e| StoreError::Zip(format!("{path}: {e}")))?;
        let mut buf = Vec::new();
        entry.read_to_end(&mut buf).map_err(|source| StoreError::Io {
            path: path.into(),
            source,
        })?;
        Ok(buf)
    }

    fn exists(&self, path: &str) -> Result<bool, StoreError> {
        let Mode::Read(archive) = &self.mode else {
            return Err(StoreError::Zip("archive opened write-only".to_string()));
        };
        let mut guard = archive.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(guard.by_name(path).is_ok())
    }

    fn list_dir(&self, path: &str) -> Result<Vec<String>, StoreError> {
        let Mode::Read(archive) = &self.mode else {
            return Err(StoreError::Zip("archive opened write-only".to_string()));
        };
        let prefix = if path.is_empty() { String::new() } else { format!("{path}/") };
        let guard = archive.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut names = Vec::new();
        for name in guard.file_names() {
            if let Some(rest) = name.strip_prefix(&prefix) {
                if let Some((first, _)) = rest.split_once('/') {
                    if !names.contains(&first.to_string()) {
                        names.push(first.to_string());
                    }
                } else if !rest.is_empty() {
                    names.push(rest.to_string());
                }
            }
        }
        Ok(names)
    }
}

struct ZipEntryWriter<'a> {
    fsys: &'a ZipFilesystem,
    path: String,
    buffer: Vec<u8>,
}

impl Write for ZipEntryWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.buffer.len() + buf.len() > self.fsys.max_buffer_bytes {
            return Err(io::Error::other(format!(
                "archive entry {:?} exceeded the {}-byte buffering budget",
                self.path, self.fsys.max_buffer_bytes
            )));
        }
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ZipEntryWriter<'_> {
    fn drop(&mut self) {
        let _ = self.fsys.write_file(&self.path, &self.buffer);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("g.zip");
        {
            let fsys = ZipFilesystem::create(&archive_path).unwrap();
            fsys.write_file("graph.pb", b"header-bytes").unwrap();
            fsys.finish().unwrap();
        }
        let fsys = ZipFilesystem::open(&archive_path).unwrap();
        assert_eq!(fsys.read_file("graph.pb").unwrap(), b"header-bytes");
        assert!(fsys.exists("graph.pb").unwrap());
    }

    #[test]
    fn oversized_write_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("g.zip");
        let fsys = ZipFilesystem::create(&archive_path).unwrap().with_max_buffer_bytes(4);
        let err = fsys.write_file("big", b"too many bytes").unwrap_err();
        assert!(matches!(err, StoreError::ArchiveEntryTooLarge { .. }));
    }

    #[test]
    fn list_dir_groups_by_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("g.zip");
        {
            let fsys = ZipFilesystem::create(&archive_path).unwrap();
            fsys.write_file("a/1.pb", b"x").unwrap();
            fsys.write_file("a/2.pb", b"y").unwrap();
            fsys.finish().unwrap();
        }
        let fsys = ZipFilesystem::open(&archive_path).unwrap();
        let mut names = fsys.list_dir("a").unwrap();
        names.sort();
        assert_eq!(names, vec!["1.pb".to_string(), "2.pb".to_string()]);
    }
}
