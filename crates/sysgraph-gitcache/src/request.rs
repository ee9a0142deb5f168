// SPDX-License-Identifier: Apache-2.0
//! Request validation and cache-key computation for `GET /get`.

use std::time::SystemTime;

use sysgraph_util::{canonicalize_repo_uri, parse_and_check_freshness};

use crate::error::CacheError;

/// A validated `GET /get` request, ready to compute a cache key from.
#[derive(Debug, Clone)]
pub struct GetRequest {
    /// Canonicalized repository URI (`https://<host>/<org>/<repo>`).
    pub canonical_uri: String,
    /// Earliest acceptable cache-entry mtime, if the caller supplied one.
    pub freshness: Option<SystemTime>,
    /// Ref to check out, with slashes already encoded to underscores for
    /// path use.
    pub encoded_ref: Option<String>,
}

impl GetRequest {
    /// Validate and canonicalize a raw `(uri, contains, ref)` triple.
    pub fn parse(uri: &str, contains: Option<&str>, reference: Option<&str>, now: SystemTime) -> Result<Self, CacheError> {
        let canonical_uri = canonicalize_repo_uri(uri).map_err(CacheError::InvalidRequest)?;
        let freshness = contains.map(|c| parse_and_check_freshness(c, now)).transpose().map_err(CacheError::InvalidRequest)?;
        let encoded_ref = reference.map(|r| r.replace('/', "_"));
        Ok(Self {
            canonical_uri,
            freshness,
            encoded_ref,
        })
    }

    /// The `host/org/repo[/ref]/repo.tgz` cache key this request maps to.
    pub fn cache_key(&self) -> String {
        let without_scheme = self
            .canonical_uri
            .strip_prefix("https://")
            .unwrap_or(&self.canonical_uri);
        match &self.encoded_ref {
            Some(r) => format!("{without_scheme}/{r}/repo.tgz"),
            None => format!("{without_scheme}/repo.tgz"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_without_ref() {
        let req = GetRequest::parse("https://github.com/org/repo", None, None, SystemTime::now()).unwrap();
        assert_eq!(req.cache_key(), "github.com/org/repo/repo.tgz");
    }

    #[test]
    fn cache_key_with_ref_encodes_slashes() {
        let req = GetRequest::parse("https://github.com/org/repo", None, Some("feature/x"), SystemTime::now()).unwrap();
        assert_eq!(req.cache_key(), "github.com/org/repo/feature_x/repo.tgz");
    }

    #[test]
    fn rejects_invalid_uri() {
        let err = GetRequest::parse("ssh://git@github.com/org/repo", None, None, SystemTime::now()).unwrap_err();
        assert!(matches!(err, CacheError::InvalidRequest(_)));
    }
}
