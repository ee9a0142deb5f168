// SPDX-License-Identifier: Apache-2.0
//! Two `GitCloner` implementations behind one interface: the native `git`
//! binary when available, and `git2` (in-process, `libgit2`) otherwise.

use std::process::Command;

use sysgraph_util::{CloneOptions, GitCloner, UtilError};

/// Clones by shelling out to the `git` binary on `PATH`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeGitClone;

impl NativeGitClone {
    /// `true` if a `git` binary is reachable on `PATH`.
    pub fn is_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .is_ok_and(|out| out.status.success())
    }
}

impl GitCloner for NativeGitClone {
    fn clone_repo(&self, options: &CloneOptions<'_>) -> Result<(), UtilError> {
        let mut cmd = Command::new("git");
        cmd.arg("clone").arg("--no-checkout");
        if options.bare {
            cmd.arg("--bare");
        }
        if options.single_branch {
            cmd.arg("--single-branch");
        }
        if let Some(depth) = options.depth {
            cmd.arg("--depth").arg(depth.to_string());
        }
        if let Some(reference) = options.reference {
            cmd.arg("--branch").arg(reference);
        }
        cmd.arg(options.uri).arg(options.dest);

        let output = cmd.output().map_err(|e| UtilError::CloneFailed(e.to_string()))?;
        if !output.status.success() {
            return Err(UtilError::CloneFailed(String::from_utf8_lossy(&output.stderr).into_owned()));
        }
        Ok(())
    }
}

/// Clones in-process via `git2` (`libgit2`), for hosts with no `git`
/// binary on `PATH`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Git2Clone;

impl GitCloner for Git2Clone {
    fn clone_repo(&self, options: &CloneOptions<'_>) -> Result<(), UtilError> {
        if options.depth.is_some() {
            return Err(UtilError::UnsupportedCloneOption("shallow (--depth) clone via git2".to_string()));
        }

        let mut repo_builder = git2::build::RepoBuilder::new();
        repo_builder.bare(options.bare);
        if let Some(reference) = options.reference {
            repo_builder.branch(reference);
        }

        repo_builder.clone(options.uri, options.dest).map_err(|e| UtilError::CloneFailed(e.message().to_string()))?;
        Ok(())
    }
}
