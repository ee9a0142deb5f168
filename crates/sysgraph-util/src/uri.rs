// SPDX-License-Identifier: Apache-2.0
//! Canonical repository URI handling for the git-cache service.

use crate::error::UtilError;

const KNOWN_HOSTS: &[&str] = &["github.com", "gitlab.com", "bitbucket.org"];

/// Canonicalize a repository URI to `https://<host>/<org>/<repo>`.
///
/// Known hosts are lowercased and stripped of a trailing `.git`. Unknown
/// schemes (`ssh://`, `git@…`) are rejected, as are URIs whose path does
/// not resolve to exactly three segments (`host/org/repo`), trailing
/// `/.`/`/..` segments, and query strings (stripped, not rejected).
pub fn canonicalize_repo_uri(uri: &str) -> Result<String, UtilError> {
    let without_query = uri.split('?').next().unwrap_or(uri);

    let rest = without_query
        .strip_prefix("https://")
        .or_else(|| without_query.strip_prefix("http://"))
        .ok_or_else(|| UtilError::UnsupportedUriScheme(uri.to_string()))?;

    let (host, path) = rest
        .split_once('/')
        .ok_or_else(|| UtilError::InvalidRepoUri(uri.to_string()))?;
    let host = host.to_lowercase();
    if !KNOWN_HOSTS.contains(&host.as_str()) {
        return Err(UtilError::UnknownHost(host));
    }

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.iter().any(|s| *s == "." || *s == "..") {
        return Err(UtilError::InvalidRepoUri(uri.to_string()));
    }
    if segments.len() != 2 {
        return Err(UtilError::InvalidRepoUri(uri.to_string()));
    }
    let org = segments[0];
    let repo = segments[1].strip_suffix(".git").unwrap_or(segments[1]);
    if org.is_empty() || repo.is_empty() {
        return Err(UtilError::InvalidRepoUri(uri.to_string()));
    }

    Ok(format!("https://{host}/{org}/{repo}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn canonicalizes_known_host_and_strips_dot_git() {
        let got = canonicalize_repo_uri("https://GitHub.com/Org/Repo.git").unwrap();
        assert_eq!(got, "https://github.com/Org/Repo");
    }

    #[test]
    fn strips_query_string() {
        let got = canonicalize_repo_uri("https://github.com/org/repo?foo=bar").unwrap();
        assert_eq!(got, "https://github.com/org/repo");
    }

    #[test]
    fn rejects_ssh_scheme() {
        let err = canonicalize_repo_uri("ssh://git@github.com/org/repo.git").unwrap_err();
        assert!(matches!(err, UtilError::UnsupportedUriScheme(_)));
    }

    #[test]
    fn rejects_git_at_scheme() {
        let err = canonicalize_repo_uri("git@github.com:org/repo.git").unwrap_err();
        assert!(matches!(err, UtilError::UnsupportedUriScheme(_)));
    }

    #[test]
    fn rejects_unknown_host() {
        let err = canonicalize_repo_uri("https://example.com/org/repo").unwrap_err();
        assert!(matches!(err, UtilError::UnknownHost(_)));
    }

    #[test]
    fn rejects_wrong_path_depth() {
        let err = canonicalize_repo_uri("https://github.com/org/repo/extra").unwrap_err();
        assert!(matches!(err, UtilError::InvalidRepoUri(_)));
        let err = canonicalize_repo_uri("https://github.com/org").unwrap_err();
        assert!(matches!(err, UtilError::InvalidRepoUri(_)));
    }

    #[test]
    fn rejects_dot_dot_segments() {
        let err = canonicalize_repo_uri("https://github.com/org/../repo").unwrap_err();
        assert!(matches!(err, UtilError::InvalidRepoUri(_)));
    }
}
