use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::trace;

use crate::write_buffer::WriteBuffer;

/// Sizing rules for a [`BufferPool`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferPoolConfig {
    /// Capacity handed out when a caller has no better estimate
    pub default_capacity: usize,
    /// Hard ceiling a single WriteBuffer may grow to
    pub max_capacity: usize,
    /// Number of released buffers kept around for reuse
    pub max_pooled_buffers: usize,
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self {
            default_capacity: 256,
            max_capacity: 16 * 1024 * 1024,
            max_pooled_buffers: 64,
        }
    }
}

/// Counters describing how a pool has been used
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub acquired: u64,
    pub reused: u64,
    pub released: u64,
    pub discarded: u64,
}

struct PoolStore {
    free: Vec<Vec<u8>>,
    stats: PoolStats,
}

/// A pool of reusable byte storage for [`WriteBuffer`]s.
///
/// The pool is a cheap, cloneable handle. Buffers acquired from it give their
/// storage back when dropped, so release happens on every exit path.
#[derive(Clone)]
pub struct BufferPool {
    config: BufferPoolConfig,
    store: Arc<Mutex<PoolStore>>,
}

impl BufferPool {
    pub fn new(config: BufferPoolConfig) -> Self {
        Self {
            config,
            store: Arc::new(Mutex::new(PoolStore {
                free: Vec::new(),
                stats: PoolStats::default(),
            })),
        }
    }

    pub fn config(&self) -> &BufferPoolConfig {
        &self.config
    }

    /// Acquire a buffer with room for at least `capacity` bytes.
    /// Requests above the configured maximum are clamped to it.
    pub fn acquire(&self, capacity: usize) -> WriteBuffer {
        let capacity = capacity.min(self.config.max_capacity);

        let mut store = self.lock();
        store.stats.acquired += 1;

        let storage = match store
            .free
            .iter()
            .position(|storage| storage.capacity() >= capacity)
        {
            Some(index) => {
                store.stats.reused += 1;
                store.free.swap_remove(index)
            }
            None => Vec::with_capacity(capacity),
        };

        WriteBuffer::pooled(storage, self.config.max_capacity, self.clone())
    }

    /// Acquire a buffer sized by `BufferPoolConfig::default_capacity`
    pub fn acquire_default(&self) -> WriteBuffer {
        self.acquire(self.config.default_capacity)
    }

    pub fn stats(&self) -> PoolStats {
        self.lock().stats
    }

    /// Number of buffers currently waiting for reuse
    pub fn idle_buffers(&self) -> usize {
        self.lock().free.len()
    }

    pub(crate) fn release(&self, mut storage: Vec<u8>) {
        storage.clear();

        let mut store = self.lock();
        if store.free.len() >= self.config.max_pooled_buffers
            || storage.capacity() > self.config.max_capacity
        {
            trace!(
                "BufferPool: discarding released buffer of capacity {}",
                storage.capacity()
            );
            store.stats.discarded += 1;
            return;
        }

        store.stats.released += 1;
        store.free.push(storage);
    }

    // the store holds no invariants a panicking holder could break
    fn lock(&self) -> MutexGuard<'_, PoolStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(BufferPoolConfig::default())
    }
}
