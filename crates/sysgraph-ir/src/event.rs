// SPDX-License-Identifier: Apache-2.0
//! The IR event shape: one `action_id` plus one typed payload.

use serde::{Deserialize, Serialize};
use sysgraph_model::{IoInfo, Resource};

/// Which side of an interaction a resource event describes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum IoDirection {
    /// The action read the resource.
    Input,
    /// The action wrote the resource.
    Output,
}

/// One typed IR event payload kind, per §2 of the action-graph model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[non_exhaustive]
pub enum EventPayload {
    /// The action began executing.
    Start,
    /// The action exited.
    End {
        /// Process exit status.
        exit_status: u32,
        /// Signal name, empty if none.
        exit_signal: String,
    },
    /// The action performed an exec, replacing its image.
    Exec {
        /// Argument vector, `argv[0]` included.
        argv: Vec<String>,
        /// The resource describing the executable binary.
        executable: Resource,
    },
    /// The action spawned a child.
    Child {
        /// Action id of the child, as assigned by the IR producer.
        child_action_id: String,
    },
    /// The action read or wrote a resource.
    ResourceIo {
        /// Input or output.
        direction: IoDirection,
        /// The resource touched.
        resource: Resource,
        /// Optional byte-count detail.
        io_info: Option<IoInfo>,
    },
    /// Free-form key/value annotations, merged into the action's metadata.
    Metadata {
        /// Key/value entries; later events with the same key overwrite
        /// earlier ones at projection time.
        entries: Vec<(String, String)>,
    },
    /// The action created a pipe (marks it eligible for risky-pipe scan).
    Pipe,
    /// The action duplicated a file descriptor (`dup`/`dup2` syscall).
    Dup {
        /// Action id of the child this dup is attributed to.
        dup_exec_id: String,
        /// The file descriptor before duplication.
        old_fd: i32,
        /// The file descriptor after duplication.
        new_fd: i32,
    },
}

/// One IR event: an action id, a timestamp, and exactly one payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    /// Opaque action identity as assigned by the IR producer.
    pub action_id: String,
    /// Observation time, used for ascending-timestamp ordering on read.
    pub timestamp: i64,
    /// The typed payload.
    pub payload: EventPayload,
}

impl Event {
    /// Construct an event for the given action id, timestamp, and payload.
    pub fn new(action_id: impl Into<String>, timestamp: i64, payload: EventPayload) -> Self {
        Self {
            action_id: action_id.into(),
            timestamp,
            payload,
        }
    }
}
