// SPDX-License-Identifier: Apache-2.0
//! A reusable pool of 32 KiB scratch buffers for digest computation.
//!
//! Hashing a large blob reader-at-a-time needs a scratch buffer; allocating
//! one per call would dominate cost for many small digests in a tight loop
//! (e.g. the graph builder's resource-dedup path). The pool hands out an
//! RAII [`PooledBuffer`] that returns its buffer to the pool on drop.

use std::sync::Mutex;

/// Default scratch buffer size used for streaming hash reads.
const BUFFER_SIZE: usize = 32 * 1024;

/// A pool of reusable scratch buffers, each [`BUFFER_SIZE`] bytes.
pub struct BufferPool {
    free: Mutex<Vec<Vec<u8>>>,
}

impl BufferPool {
    /// Create an empty pool; buffers are allocated lazily on first use.
    pub fn new() -> Self {
        Self {
            free: Mutex::new(Vec::new()),
        }
    }

    /// Acquire a buffer, allocating a new one if the pool is empty.
    pub fn acquire(&self) -> PooledBuffer<'_> {
        let buf = self
            .free
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .pop()
            .unwrap_or_else(|| vec![0u8; BUFFER_SIZE]);
        PooledBuffer { buf, pool: self }
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

/// A scratch buffer on loan from a [`BufferPool`]; returned to the pool when
/// dropped.
pub struct PooledBuffer<'a> {
    buf: Vec<u8>,
    pool: &'a BufferPool,
}

impl PooledBuffer<'_> {
    /// Borrow the underlying buffer's bytes, mutably.
    pub fn as_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        let buf = std::mem::take(&mut self.buf);
        if let Ok(mut free) = self.pool.free.lock() {
            free.push(buf);
        }
    }
}
