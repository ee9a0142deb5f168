// SPDX-License-Identifier: Apache-2.0
//! The pluggable filesystem backend: directory, zip archive, or remote
//! object store, behind one interface.

use std::io::Write;

use crate::error::StoreError;

/// Backend-agnostic filesystem operations the writer/reader need.
///
/// Three implementations: [`DirFilesystem`] (plain directory),
/// [`ZipFilesystem`] (a single zip archive file, writes serialized behind a
/// lock since archives admit one entry at a time), and
/// [`RemoteFilesystem`] (an `object_store`-backed adapter covering both
/// directory-prefix and single-archive remote modes).
pub trait Filesystem: Send + Sync {
    /// Create `path` and all missing parent directories.
    fn mkdir_all(&self, path: &str) -> Result<(), StoreError>;

    /// Write `bytes` to `path`, creating parent directories as needed.
    fn write_file(&self, path: &str, bytes: &[u8]) -> Result<(), StoreError>;

    /// Open a streaming writer for `path`.
    fn file_writer(&self, path: &str) -> Result<Box<dyn Write + Send + '_>, StoreError>;

    /// Read the full contents of `path`.
    fn read_file(&self, path: &str) -> Result<Vec<u8>, StoreError>;

    /// `true` if `path` exists.
    fn exists(&self, path: &str) -> Result<bool, StoreError>;

    /// List entries directly under `path` (file and directory names, not
    /// full paths).
    fn list_dir(&self, path: &str) -> Result<Vec<String>, StoreError>;
}

mod dir;
mod remote;
mod zip_fs;

pub use dir::DirFilesystem;
pub use remote::RemoteFilesystem;
pub use zip_fs::ZipFilesystem;
