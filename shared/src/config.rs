use skein_serde::{BufferPool, BufferPoolConfig};

/// Contains config properties which will be shared by every replicated object
#[derive(Clone, Debug)]
pub struct ReplicationConfig {
    /// Sizing of the serialization buffer pool
    pub pool: BufferPoolConfig,
    /// How many unacknowledged snapshots are remembered per connection.
    /// Acks for snapshots older than this window are ignored.
    pub max_in_flight_snapshots: usize,
    /// How many values for not-yet-registered slots an object will hold on to
    pub max_pending_slots: usize,
}

impl ReplicationConfig {
    pub fn build_pool(&self) -> BufferPool {
        BufferPool::new(self.pool.clone())
    }
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            pool: BufferPoolConfig::default(),
            max_in_flight_snapshots: 32,
            max_pending_slots: 256,
        }
    }
}
