// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Scratch buffer pool for envelope bodies.
//!
//! Encoding a decoded envelope needs its body bytes before it can write the
//! length prefix, so every such encode borrows a scratch buffer. Buffers are
//! kept in a lock-free freelist (crossbeam `ArrayQueue`) and handed out as
//! [`PooledBuffer`] guards that return the allocation on drop, whichever way
//! the encode exits.

use crate::config::EncodingLimits;
use crate::core::ser::{BinaryEncoder, CodecResult};
use crossbeam::queue::ArrayQueue;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

/// Default number of pooled buffers.
pub const DEFAULT_POOL_SLOTS: usize = 32;
/// Initial capacity of a fresh buffer.
pub const DEFAULT_BUFFER_CAPACITY: usize = 4096;
/// Buffers grown beyond this are dropped instead of returned.
const MAX_RETAINED_CAPACITY: usize = 1024 * 1024;

pub struct BufferPool {
    free: ArrayQueue<Vec<u8>>,
    buffer_capacity: usize,
    /// Acquisitions that found the freelist empty (diagnostic)
    exhausted_count: AtomicU64,
}

impl BufferPool {
    /// # Panics
    /// Panics if `slots` is zero.
    pub fn new(slots: usize, buffer_capacity: usize) -> Self {
        assert!(slots > 0, "BufferPool needs at least one slot");
        Self {
            free: ArrayQueue::new(slots),
            buffer_capacity,
            exhausted_count: AtomicU64::new(0),
        }
    }

    /// Process-wide pool used by envelope encoding.
    pub fn shared() -> &'static BufferPool {
        static SHARED: OnceLock<BufferPool> = OnceLock::new();
        SHARED.get_or_init(|| BufferPool::new(DEFAULT_POOL_SLOTS, DEFAULT_BUFFER_CAPACITY))
    }

    /// Take a buffer, allocating one when the freelist is empty.
    pub fn acquire(&self) -> PooledBuffer<'_> {
        let buf = match self.free.pop() {
            Some(buf) => buf,
            None => {
                self.exhausted_count.fetch_add(1, Ordering::Relaxed);
                Vec::with_capacity(self.buffer_capacity)
            }
        };
        PooledBuffer { pool: self, buf }
    }

    /// Buffers currently idle in the freelist.
    pub fn available(&self) -> usize {
        self.free.len()
    }

    pub fn exhausted_count(&self) -> u64 {
        self.exhausted_count.load(Ordering::Relaxed)
    }

    fn release(&self, mut buf: Vec<u8>) {
        if buf.capacity() == 0 || buf.capacity() > MAX_RETAINED_CAPACITY {
            return;
        }
        buf.clear();
        // A full freelist drops the buffer.
        let _ = self.free.push(buf);
    }
}

/// Buffer on loan from a [`BufferPool`].
pub struct PooledBuffer<'a> {
    pool: &'a BufferPool,
    buf: Vec<u8>,
}

impl PooledBuffer<'_> {
    /// Run `f` against an encoder writing into this buffer and return the
    /// bytes written. The allocation comes back even when `f` fails.
    pub fn encode_with<F>(&mut self, limits: EncodingLimits, f: F) -> CodecResult<&[u8]>
    where
        F: FnOnce(&mut BinaryEncoder) -> CodecResult<()>,
    {
        let mut enc = BinaryEncoder::from_vec(std::mem::take(&mut self.buf), limits);
        let result = f(&mut enc);
        self.buf = enc.into_inner();
        result.map(|()| self.buf.as_slice())
    }
}

impl Deref for PooledBuffer<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buf
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buf));
    }
}
