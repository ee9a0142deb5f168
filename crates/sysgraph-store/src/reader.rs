// SPDX-License-Identifier: Apache-2.0
//! Read-through access to a flat on-disk graph, with single-flight
//! collapsing of concurrent first-reads of the same action.

use sysgraph_model::{Action, ResourceDb, SysGraphHeader};
use sysgraph_util::SingleFlight;

use crate::error::StoreError;
use crate::fs::Filesystem;
use crate::layout::{read_action, read_header, read_rdb};

/// A cached reader over a single flat graph rooted at a [`Filesystem`].
///
/// Concurrent reads of the same action id that miss the cache are
/// coalesced: only one of them touches the backing filesystem, and the
/// rest wait for and clone its result. A read that fails is not cached —
/// the key is forgotten once the single-flight call completes, so the next
/// read retries.
pub struct GraphReader<'a> {
    fsys: &'a dyn Filesystem,
    actions: SingleFlight<i64, Action, String>,
}

impl<'a> GraphReader<'a> {
    /// Wrap `fsys` for cached reads.
    pub fn new(fsys: &'a dyn Filesystem) -> Self {
        Self {
            fsys,
            actions: SingleFlight::new(),
        }
    }

    /// Read the graph header.
    pub fn header(&self) -> Result<SysGraphHeader, StoreError> {
        read_header(self.fsys, "")
    }

    /// Read the resource DB.
    pub fn rdb(&self) -> Result<ResourceDb, StoreError> {
        read_rdb(self.fsys, "")
    }

    /// Read action `id`, coalescing concurrent reads of the same id.
    pub fn action(&self, id: i64) -> Result<Action, StoreError> {
        self.actions
            .execute(id, || read_action(self.fsys, "", id).map_err(|e| e.to_string()))
            .map_err(StoreError::Cached)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fs::DirFilesystem;
    use crate::layout::write_graph;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn reads_header_rdb_and_action() {
        let dir = tempfile::tempdir().unwrap();
        let fsys = DirFilesystem::new(dir.path());
        let header = SysGraphHeader::new("g1");
        let actions = vec![Action::new(1, "g1")];
        write_graph(&fsys, "", &header, &ResourceDb::new(), &actions, false).unwrap();

        let reader = GraphReader::new(&fsys);
        assert_eq!(reader.header().unwrap().id, "g1");
        assert!(reader.rdb().unwrap().is_empty());
        assert_eq!(reader.action(1).unwrap().id, 1);
    }

    #[test]
    fn missing_action_surfaces_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let fsys = DirFilesystem::new(dir.path());
        let header = SysGraphHeader::new("g1");
        write_graph(&fsys, "", &header, &ResourceDb::new(), &[], false).unwrap();

        let reader = GraphReader::new(&fsys);
        let err = reader.action(42).unwrap_err();
        assert!(matches!(err, StoreError::Cached(msg) if msg.contains("42")));
    }

    #[test]
    fn concurrent_reads_of_same_action_are_coalesced() {
        let dir = tempfile::tempdir().unwrap();
        let fsys = DirFilesystem::new(dir.path());
        let header = SysGraphHeader::new("g1");
        let actions = vec![Action::new(7, "g1")];
        write_graph(&fsys, "", &header, &ResourceDb::new(), &actions, false).unwrap();

        let reader = GraphReader::new(&fsys);
        let hits = AtomicUsize::new(0);
        thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    scope.spawn(|| {
                        let action = reader.action(7).unwrap();
                        hits.fetch_add(1, Ordering::SeqCst);
                        action.id
                    })
                })
                .collect();
            for h in handles {
                assert_eq!(h.join().unwrap(), 7);
            }
        });
        assert_eq!(hits.load(Ordering::SeqCst), 4);
    }
}
