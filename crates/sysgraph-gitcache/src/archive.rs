// SPDX-License-Identifier: Apache-2.0
//! Streams a directory tree into a gzipped tar, root-stripped and
//! forward-slash-normalized, flushing the compressor periodically and
//! removing each regular file from the staging filesystem once tarred.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use tar::{Builder, Header};

/// Flush the wrapped writer after every this many bytes pass through it,
/// bounding the compressor's internal buffer while tarring a large tree.
const FLUSH_THRESHOLD: usize = 1024 * 1024;

/// Tar up `root`'s contents (entry paths relative to `root`, forward slash
/// separated) into a gzip stream written to `sink`, deleting each regular
/// file from disk immediately after its bytes are appended.
pub fn tar_gz_directory<W: Write>(root: &Path, sink: W) -> std::io::Result<()> {
    let encoder = GzEncoder::new(sink, Compression::default());
    let mut flushing = FlushEvery::new(encoder);
    {
        let mut builder = Builder::new(&mut flushing);
        append_tree(&mut builder, root, root)?;
        builder.finish()?;
    }
    flushing.into_inner().finish()?;
    Ok(())
}

fn append_tree<W: Write>(builder: &mut Builder<W>, root: &Path, dir: &Path) -> std::io::Result<()> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?.filter_map(|e| e.ok()).map(|e| e.path()).collect();
    entries.sort();

    for path in entries {
        let relative = path.strip_prefix(root).unwrap_or(&path);
        let archive_path = normalize(relative);
        let metadata = fs::symlink_metadata(&path)?;

        if metadata.is_dir() {
            let mut header = Header::new_gnu();
            header.set_entry_type(tar::EntryType::Directory);
            header.set_size(0);
            header.set_mode(0o755);
            header.set_mtime(mtime_secs(&metadata));
            header.set_cksum();
            builder.append_data(&mut header, format!("{archive_path}/"), std::io::empty())?;
            append_tree(builder, root, &path)?;
        } else if metadata.is_file() {
            let mut header = Header::new_gnu();
            header.set_entry_type(tar::EntryType::Regular);
            header.set_size(metadata.len());
            header.set_mode(0o644);
            header.set_mtime(mtime_secs(&metadata));
            header.set_cksum();
            let file = fs::File::open(&path)?;
            builder.append_data(&mut header, &archive_path, file)?;
            fs::remove_file(&path)?;
        }
        // Symlinks inside a bare clone's `.git` directory (none expected in
        // practice) are skipped rather than followed or faithfully encoded.
    }
    Ok(())
}

fn normalize(relative: &Path) -> String {
    relative.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect::<Vec<_>>().join("/")
}

fn mtime_secs(metadata: &fs::Metadata) -> u64 {
    metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_secs())
}

/// Wraps a `Write`, flushing it every [`FLUSH_THRESHOLD`] bytes written.
struct FlushEvery<W> {
    inner: W,
    since_flush: usize,
}

impl<W: Write> FlushEvery<W> {
    fn new(inner: W) -> Self {
        Self { inner, since_flush: 0 }
    }

    fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for FlushEvery<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.since_flush += written;
        if self.since_flush >= FLUSH_THRESHOLD {
            self.inner.flush()?;
            self.since_flush = 0;
        }
        Ok(written)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn tars_directory_with_root_stripped_forward_slash_names_and_removes_files() {
        let src = tempfile::tempdir().unwrap();
        fs::create_dir_all(src.path().join("sub")).unwrap();
        fs::write(src.path().join("HEAD"), b"ref: refs/heads/main\n").unwrap();
        fs::write(src.path().join("sub/config"), b"[core]\n").unwrap();

        let mut out = Vec::new();
        tar_gz_directory(src.path(), &mut out).unwrap();

        assert!(!src.path().join("HEAD").exists());
        assert!(!src.path().join("sub/config").exists());

        let decoder = flate2::read::GzDecoder::new(out.as_slice());
        let mut archive = tar::Archive::new(decoder);
        let mut names: Vec<String> = archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["HEAD", "sub/", "sub/config"]);
    }
}
