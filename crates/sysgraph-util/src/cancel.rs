// SPDX-License-Identifier: Apache-2.0
//! Cooperative cancellation handle shared across parallel workers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cloneable cancellation flag.
///
/// All long-running operations (graph build, map/range/filter, writer
/// fan-out) accept a [`Cancel`] and check it at suspension points (I/O,
/// channel sends). There is no blocking API that ignores cancellation.
#[derive(Debug, Clone, Default)]
pub struct Cancel {
    flag: Arc<AtomicBool>,
}

impl Cancel {
    /// A fresh, not-yet-cancelled handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark this handle (and every clone of it) as cancelled.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// `true` if [`cancel`](Self::cancel) has been called on this handle or
    /// any clone of it.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
