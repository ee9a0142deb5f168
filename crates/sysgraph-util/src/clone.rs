// SPDX-License-Identifier: Apache-2.0
//! The generic git-clone abstraction shared by the native-binary and
//! in-process implementations in `sysgraph-gitcache`.

use std::path::Path;

use crate::error::UtilError;

/// Parameters for a single clone operation.
///
/// Only the option matrix the spec names is representable here
/// (`--bare`, `--depth`, `--single-branch`, `--branch`, submodule update via
/// checkout). Anything else (auth, custom remote name, arbitrary tag modes,
/// TLS bypass, custom CA) has no field to carry it, so callers asking for it
/// fail fast with [`UtilError::UnsupportedCloneOption`].
pub struct CloneOptions<'a> {
    /// Canonicalized repository URI to clone from.
    pub uri: &'a str,
    /// Destination directory; must not exist yet.
    pub dest: &'a Path,
    /// Specific ref to check out, if any.
    pub reference: Option<&'a str>,
    /// Clone with no working tree.
    pub bare: bool,
    /// Only fetch the history of the single branch being cloned.
    pub single_branch: bool,
    /// Shallow-clone depth, if any.
    pub depth: Option<u32>,
}

/// A git-cloning backend.
///
/// Two implementations sit behind this trait in `sysgraph-gitcache`:
/// `NativeGitClone` (shells out to the `git` binary) and `Git2Clone` (the
/// `git2` crate, in-process). Backend selection is a constructor parameter.
pub trait GitCloner: Send + Sync {
    /// Perform the clone described by `options`.
    fn clone_repo(&self, options: &CloneOptions<'_>) -> Result<(), UtilError>;
}
