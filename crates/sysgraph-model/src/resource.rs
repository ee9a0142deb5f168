// SPDX-License-Identifier: Apache-2.0
//! Resource identity: a tagged union over resource kinds, addressed by the
//! digest of its canonical serialization.

use serde::{Deserialize, Serialize};
use sysgraph_digest::Digest;

/// Classification of a `FILE` resource.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[non_exhaustive]
pub enum FileType {
    /// A regular file.
    Regular,
    /// A directory.
    Directory,
    /// A symbolic link.
    Symlink,
}

/// One end of a duplicated file descriptor, as observed by a `Dup` syscall.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StdIoDup {
    /// The file descriptor before duplication.
    pub old_fd: i32,
    /// The file descriptor after duplication (0 = stdin, 1 = stdout).
    pub new_fd: i32,
}

/// Any addressable thing an action reads or writes.
///
/// `#[non_exhaustive]` leaves room for resource kinds this graph generation
/// doesn't yet model (per spec §3: "plus future variants"). Identity is the
/// digest of the canonical serialization — two resources are equal iff
/// their digests are equal, never by structural comparison.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[non_exhaustive]
pub enum Resource {
    /// A file on disk (or in a container filesystem snapshot).
    File {
        /// Path as observed at interaction time.
        path: String,
        /// Content digest of the file's bytes.
        digest: Digest,
        /// Kind of filesystem entry.
        file_type: FileType,
    },
    /// A network endpoint an action connected to or listened on.
    NetworkAddress {
        /// Transport protocol, e.g. `"tcp"` or `"udp"`.
        protocol: String,
        /// Address string, e.g. `"10.0.0.1:443"`.
        address: String,
    },
    /// A synthetic resource representing one risky pipe between two
    /// children of the same parent (see graph-builder phase 3).
    Pipe {
        /// The reader's dup record.
        read_end: StdIoDup,
        /// Action id of the child that read from the pipe.
        read_exec_id: String,
        /// The writer's dup record.
        write_end: StdIoDup,
        /// Action id of the child that wrote to the pipe.
        write_exec_id: String,
    },
}

impl Resource {
    /// Compute this resource's identity digest over its canonical
    /// serialization. Two resources with equal digests are the same
    /// resource regardless of which fields produced them.
    pub fn digest(&self) -> Digest {
        // `bincode` over a `#[derive(Serialize)]` enum is deterministic for
        // fixed field order, which is all we construct here.
        Digest::of_record(self).unwrap_or_else(|_| Digest::empty())
    }
}
