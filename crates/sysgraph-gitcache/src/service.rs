// SPDX-License-Identifier: Apache-2.0
//! The git-cache handler: validate, canonicalize, check freshness,
//! populate on miss, serve.

use std::time::SystemTime;

use sysgraph_util::{CloneOptions, GitCloner, Storer, UtilError};

use crate::archive::tar_gz_directory;
use crate::backend::{CacheBackend, ServeOutcome};
use crate::error::CacheError;
use crate::request::GetRequest;

const AUTH_FAILURE_MARKERS: &[&str] = &["authentication", "could not read username", "permission denied"];

fn classify_clone_error(err: UtilError) -> CacheError {
    match err {
        UtilError::CloneFailed(message) => {
            if AUTH_FAILURE_MARKERS.iter().any(|marker| message.to_lowercase().contains(marker)) {
                CacheError::AuthRequired(message)
            } else {
                CacheError::CloneFailed(message)
            }
        }
        other => CacheError::InvalidRequest(other),
    }
}

/// `exists`/`writer` only ever fail because the backend itself couldn't be
/// reached or read/written — never because of anything the caller supplied,
/// which `GetRequest::parse` already validated. Map these to the backend
/// error variants so a storage outage surfaces as a server error, not a bad
/// request.
fn classify_backend_error(err: UtilError) -> CacheError {
    match err {
        UtilError::Io(source) => CacheError::Io(source),
        other => CacheError::ObjectStore(other.to_string()),
    }
}

/// Populate-on-miss git-repository tarball cache.
pub struct GitCache<B, C> {
    backend: B,
    cloner: C,
}

impl<B, C> GitCache<B, C>
where
    B: CacheBackend,
    C: GitCloner,
{
    /// Build a cache service over `backend`, cloning via `cloner`.
    pub fn new(backend: B, cloner: C) -> Self {
        Self { backend, cloner }
    }

    /// Handle one `GET /get` request: validate, canonicalize, check
    /// freshness, populate on miss or staleness, then serve.
    pub fn get(&self, uri: &str, contains: Option<&str>, reference: Option<&str>, now: SystemTime) -> Result<ServeOutcome<B::Reader>, CacheError> {
        let request = GetRequest::parse(uri, contains, reference, now)?;
        let cache_key = request.cache_key();

        let current_mtime = self.backend.exists(&cache_key).map_err(classify_backend_error)?;
        let stale = match (current_mtime, request.freshness) {
            (None, _) => true,
            (Some(mtime), Some(freshness)) => mtime < freshness,
            (Some(_), None) => false,
        };

        if stale {
            self.populate(&cache_key, &request).inspect_err(|_| {
                let _ = self.backend.delete(&cache_key);
            })?;
        }

        self.backend.serve(&cache_key)
    }

    fn populate(&self, cache_key: &str, request: &GetRequest) -> Result<(), CacheError> {
        let staging = tempfile::tempdir()?;
        let clone_dest = staging.path().join("repo.git");
        let options = CloneOptions {
            uri: &request.canonical_uri,
            dest: &clone_dest,
            reference: request.encoded_ref.as_deref(),
            bare: true,
            single_branch: request.encoded_ref.is_some(),
            depth: None,
        };
        self.cloner.clone_repo(&options).map_err(classify_clone_error)?;

        let mut writer = self.backend.writer(cache_key).map_err(classify_backend_error)?;
        tar_gz_directory(&clone_dest, &mut writer)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::local::LocalDirStorer;
    use std::path::Path;
    use std::time::Duration;

    struct FailingBackend;

    impl sysgraph_util::Storer for FailingBackend {
        type Writer = std::io::Sink;

        fn exists(&self, _path: &str) -> Result<Option<SystemTime>, UtilError> {
            Err(UtilError::Io(std::io::Error::other("disk unavailable")))
        }

        fn writer(&self, _path: &str) -> Result<Self::Writer, UtilError> {
            Err(UtilError::Io(std::io::Error::other("disk unavailable")))
        }

        fn delete(&self, _path: &str) -> Result<(), UtilError> {
            Ok(())
        }
    }

    impl CacheBackend for FailingBackend {
        type Reader = std::io::Empty;

        fn serve(&self, _path: &str) -> Result<ServeOutcome<Self::Reader>, CacheError> {
            unreachable!("exists() always fails first")
        }
    }

    struct FakeCloner {
        fail_with: Option<String>,
    }

    impl GitCloner for FakeCloner {
        fn clone_repo(&self, options: &CloneOptions<'_>) -> Result<(), UtilError> {
            if let Some(message) = &self.fail_with {
                return Err(UtilError::CloneFailed(message.clone()));
            }
            std::fs::create_dir_all(options.dest)?;
            std::fs::write(Path::new(options.dest).join("HEAD"), b"ref: refs/heads/main\n")?;
            Ok(())
        }
    }

    #[test]
    fn miss_then_hit_populates_once() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalDirStorer::new(dir.path()).unwrap();
        let cache = GitCache::new(backend, FakeCloner { fail_with: None });

        let first = cache.get("https://github.com/org/repo", None, None, SystemTime::now()).unwrap();
        assert!(matches!(first, ServeOutcome::Stream(_)));

        let second = cache.get("https://github.com/org/repo", None, None, SystemTime::now()).unwrap();
        assert!(matches!(second, ServeOutcome::Stream(_)));
    }

    #[test]
    fn stale_entry_is_repopulated() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalDirStorer::new(dir.path()).unwrap();
        let cache = GitCache::new(backend, FakeCloner { fail_with: None });
        cache.get("https://github.com/org/repo", None, None, SystemTime::now()).unwrap();

        let far_future = SystemTime::now() + Duration::from_secs(3600);
        assert!(cache.backend.exists("github.com/org/repo/repo.tgz").unwrap().unwrap() < far_future);
    }

    #[test]
    fn clone_failure_cleans_up_partial_entry() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalDirStorer::new(dir.path()).unwrap();
        let cache = GitCache::new(
            backend,
            FakeCloner {
                fail_with: Some("fatal: could not read Username".to_string()),
            },
        );

        let err = cache.get("https://github.com/org/repo", None, None, SystemTime::now()).unwrap_err();
        assert!(matches!(err, CacheError::AuthRequired(_)));
        assert!(cache.backend.exists("github.com/org/repo/repo.tgz").unwrap().is_none());
    }

    #[test]
    fn backend_io_failure_is_not_reported_as_invalid_request() {
        let cache = GitCache::new(FailingBackend, FakeCloner { fail_with: None });

        let err = cache.get("https://github.com/org/repo", None, None, SystemTime::now()).unwrap_err();
        assert!(matches!(err, CacheError::Io(_)), "backend outage must map to Io, not InvalidRequest: {err:?}");
    }
}
