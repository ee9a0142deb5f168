// SPDX-License-Identifier: Apache-2.0
//! The `IrStore` trait: the write/read contract every backend implements.

use std::sync::mpsc;

use crate::error::IrError;
use crate::event::Event;

/// The two channels `raw_events` hands back: one for data, one for
/// mid-stream errors. The data channel is only ever absent (not empty) when
/// the action has no raw events at all.
pub struct RawEventChannels {
    /// Raw record bytes, in write order.
    pub data: mpsc::Receiver<Vec<u8>>,
    /// Errors encountered while streaming, if any.
    pub errors: mpsc::Receiver<IrError>,
}

/// A backend for writing and reading the kernel-observed event stream.
///
/// Implementations: [`crate::MemoryIrStore`] (in-memory, test fixtures and
/// small builds) and [`crate::FileIrStore`] (on-disk, one file per action).
pub trait IrStore {
    /// Append events, grouped by `action_id`. Returns the number of bytes
    /// written to the underlying backend.
    fn write_events(&self, events: &[Event]) -> Result<usize, IrError>;

    /// Append opaque pass-through records for later forensic inspection.
    /// Returns the number of bytes written.
    fn write_raw_events(&self, action_id: &str, raw: &[Vec<u8>]) -> Result<usize, IrError>;

    /// The set of known action ids, in no particular order.
    fn actions(&self) -> Result<Vec<String>, IrError>;

    /// All events for an action, sorted ascending by timestamp. Ties are
    /// broken by original write order (a stable sort).
    fn events(&self, action_id: &str) -> Result<Vec<Event>, IrError>;

    /// Raw events for an action, or `None` if none were ever written — as
    /// opposed to an empty stream, which this backend never produces.
    fn raw_events(&self, action_id: &str) -> Result<Option<RawEventChannels>, IrError>;
}
