// SPDX-License-Identifier: Apache-2.0
//! The resource database: every resource touched anywhere in a graph,
//! deduplicated by digest.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::resource::Resource;

/// A deduplicated store of [`Resource`] values keyed by their canonical
/// digest string.
///
/// Insertion is idempotent: inserting a resource whose digest is already
/// present is a no-op, matching the content-addressed semantics used
/// throughout the graph (identity is the digest, not structural equality).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResourceDb {
    resources: BTreeMap<String, Resource>,
}

impl ResourceDb {
    /// An empty resource database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a resource, keyed by its own digest. Returns the canonical
    /// digest string it was stored under.
    pub fn insert(&mut self, resource: Resource) -> String {
        let key = resource.digest().canonical();
        self.resources.entry(key.clone()).or_insert(resource);
        key
    }

    /// Look up a resource by its canonical digest string.
    pub fn get(&self, digest: &str) -> Option<&Resource> {
        self.resources.get(digest)
    }

    /// `true` if a resource with this digest is present.
    pub fn contains(&self, digest: &str) -> bool {
        self.resources.contains_key(digest)
    }

    /// Number of distinct resources stored.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// `true` if no resources have been inserted.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Iterate all (digest, resource) pairs in ascending digest order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Resource)> {
        self.resources.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Merge another resource database into this one, keeping this one's
    /// entry on digest collision (which will always be identical content,
    /// since the digest is derived from the content).
    pub fn merge(&mut self, other: ResourceDb) {
        for (key, resource) in other.resources {
            self.resources.entry(key).or_insert(resource);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::resource::{FileType, Resource};
    use sysgraph_digest::Digest;

    fn sample_file(path: &str) -> Resource {
        Resource::File {
            path: path.to_string(),
            digest: Digest::of_bytes(path.as_bytes()),
            file_type: FileType::Regular,
        }
    }

    #[test]
    fn insert_dedups_by_digest() {
        let mut db = ResourceDb::new();
        let k1 = db.insert(sample_file("/bin/sh"));
        let k2 = db.insert(sample_file("/bin/sh"));
        assert_eq!(k1, k2);
        assert_eq!(db.len(), 1);
    }

    #[test]
    fn distinct_resources_both_stored() {
        let mut db = ResourceDb::new();
        db.insert(sample_file("/bin/sh"));
        db.insert(sample_file("/bin/bash"));
        assert_eq!(db.len(), 2);
    }

    #[test]
    fn merge_combines_without_duplicating() {
        let mut a = ResourceDb::new();
        a.insert(sample_file("/bin/sh"));
        let mut b = ResourceDb::new();
        b.insert(sample_file("/bin/sh"));
        b.insert(sample_file("/bin/bash"));
        a.merge(b);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn get_returns_stored_resource() {
        let mut db = ResourceDb::new();
        let key = db.insert(sample_file("/bin/sh"));
        assert!(db.get(&key).is_some());
        assert!(db.contains(&key));
    }
}
