//! Reusable scratch buffers for rendering log lines.

use std::ops::{Deref, DerefMut};
use std::sync::Mutex;

const INITIAL_CAPACITY: usize = 256;
const MAX_POOLED: usize = 32;
/// Buffers that grew past this are dropped instead of pooled.
const MAX_RETAINED_CAPACITY: usize = 64 * 1024;

#[derive(Debug, Default)]
pub struct BufferPool {
    free: Mutex<Vec<Vec<u8>>>,
}

impl BufferPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow an empty buffer; it returns to the pool when dropped.
    pub fn get(&self) -> PooledBuffer<'_> {
        let buf = self
            .free
            .lock()
            .ok()
            .and_then(|mut free| free.pop())
            .unwrap_or_else(|| Vec::with_capacity(INITIAL_CAPACITY));
        PooledBuffer { buf, pool: self }
    }

    fn put(&self, mut buf: Vec<u8>) {
        if buf.capacity() > MAX_RETAINED_CAPACITY {
            return;
        }
        buf.clear();
        if let Ok(mut free) = self.free.lock() {
            if free.len() < MAX_POOLED {
                free.push(buf);
            }
        }
    }

    pub fn idle(&self) -> usize {
        self.free.lock().map(|f| f.len()).unwrap_or(0)
    }
}

pub struct PooledBuffer<'a> {
    buf: Vec<u8>,
    pool: &'a BufferPool,
}

impl Deref for PooledBuffer<'_> {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.buf
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.pool.put(std::mem::take(&mut self.buf));
    }
}
