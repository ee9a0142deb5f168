// SPDX-License-Identifier: Apache-2.0
//! Resource matchers: path-based built-ins over `Resource::File`, plus
//! combinators. Non-`File` resources never match a path matcher.

use regex::Regex;
use sysgraph_model::Resource;

use crate::error::MatchError;
use crate::value::{Extraction, ExtractedValue};

/// Decides whether a resource matches, optionally returning named
/// extractions.
pub trait ResourceMatcher: Send + Sync {
    /// Evaluate this matcher against `resource`. `Some` (even an empty map)
    /// means it matched; `None` means it didn't.
    fn eval(&self, resource: &Resource) -> Option<Extraction>;
}

fn file_path(resource: &Resource) -> Option<&str> {
    match resource {
        Resource::File { path, .. } => Some(path.as_str()),
        Resource::NetworkAddress { .. } | Resource::Pipe { .. } => None,
    }
}

/// Matches a `File` resource whose path equals a fixed string exactly.
pub struct PathEq(
    /// The exact path to match.
    pub String,
);

impl ResourceMatcher for PathEq {
    fn eval(&self, resource: &Resource) -> Option<Extraction> {
        (file_path(resource)? == self.0).then(Extraction::new)
    }
}

/// Matches a `File` resource whose path starts with a fixed prefix.
pub struct PathPrefix(
    /// The required prefix.
    pub String,
);

impl ResourceMatcher for PathPrefix {
    fn eval(&self, resource: &Resource) -> Option<Extraction> {
        file_path(resource)?.starts_with(self.0.as_str()).then(Extraction::new)
    }
}

/// Matches a `File` resource whose path ends with a fixed suffix.
pub struct PathSuffix(
    /// The required suffix.
    pub String,
);

impl ResourceMatcher for PathSuffix {
    fn eval(&self, resource: &Resource) -> Option<Extraction> {
        file_path(resource)?.ends_with(self.0.as_str()).then(Extraction::new)
    }
}

/// Matches a `File` resource whose path satisfies a regular expression.
pub struct PathRegex(Regex);

impl PathRegex {
    /// Compile `pattern` into a path matcher.
    pub fn new(pattern: &str) -> Result<Self, MatchError> {
        Ok(Self(Regex::new(pattern)?))
    }
}

impl ResourceMatcher for PathRegex {
    fn eval(&self, resource: &Resource) -> Option<Extraction> {
        self.0.is_match(file_path(resource)?).then(Extraction::new)
    }
}

/// Wraps a matcher, capturing the matched resource under `name` when it
/// matches.
pub struct ExtractAs<M> {
    /// The name the matched resource is captured under.
    pub name: String,
    /// The matcher deciding whether this resource matches at all.
    pub inner: M,
}

impl<M: ResourceMatcher> ResourceMatcher for ExtractAs<M> {
    fn eval(&self, resource: &Resource) -> Option<Extraction> {
        let mut extraction = self.inner.eval(resource)?;
        extraction.insert(self.name.clone(), ExtractedValue::Resource(resource.clone()));
        Some(extraction)
    }
}

/// Matches when every sub-matcher matches; extractions are merged.
pub struct AllOf(
    /// Sub-matchers, all of which must match.
    pub Vec<Box<dyn ResourceMatcher>>,
);

impl ResourceMatcher for AllOf {
    fn eval(&self, resource: &Resource) -> Option<Extraction> {
        let mut extraction = Extraction::new();
        for matcher in &self.0 {
            extraction.extend(matcher.eval(resource)?);
        }
        Some(extraction)
    }
}

/// Matches when none of the sub-matchers match.
pub struct NoneOf(
    /// Sub-matchers, none of which may match.
    pub Vec<Box<dyn ResourceMatcher>>,
);

impl ResourceMatcher for NoneOf {
    fn eval(&self, resource: &Resource) -> Option<Extraction> {
        if self.0.iter().any(|matcher| matcher.eval(resource).is_some()) {
            None
        } else {
            Some(Extraction::new())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sysgraph_digest::Digest;
    use sysgraph_model::FileType;

    fn file(path: &str) -> Resource {
        Resource::File {
            path: path.to_string(),
            digest: Digest::of_bytes(path.as_bytes()),
            file_type: FileType::Regular,
        }
    }

    fn network() -> Resource {
        Resource::NetworkAddress {
            protocol: "tcp".to_string(),
            address: "10.0.0.1:443".to_string(),
        }
    }

    #[test]
    fn path_eq_matches_exactly() {
        let matcher = PathEq("a/b".to_string());
        assert!(matcher.eval(&file("a/b")).is_some());
        assert!(matcher.eval(&file("a/bc")).is_none());
    }

    #[test]
    fn path_prefix_and_suffix() {
        assert!(PathPrefix("a/".to_string()).eval(&file("a/b")).is_some());
        assert!(PathSuffix(".log".to_string()).eval(&file("a/b.log")).is_some());
        assert!(PathSuffix(".log".to_string()).eval(&file("a/b.txt")).is_none());
    }

    #[test]
    fn path_regex_matches() {
        let matcher = PathRegex::new(r"^a/.*\.log$").unwrap();
        assert!(matcher.eval(&file("a/b.log")).is_some());
        assert!(matcher.eval(&file("a/b.txt")).is_none());
    }

    #[test]
    fn non_file_resources_never_match_path_matchers() {
        assert!(PathPrefix(String::new()).eval(&network()).is_none());
    }

    #[test]
    fn none_of_rejects_matching_paths() {
        let matcher = NoneOf(vec![Box::new(PathPrefix("tmp/".to_string()))]);
        assert!(matcher.eval(&file("tmp/x")).is_none());
        assert!(matcher.eval(&file("var/x")).is_some());
    }
}
