use std::collections::HashMap;

use crate::{replication::SnapshotId, ConnectionId};

/// Newest snapshot applied from each connection, so late or duplicated
/// snapshots can be discarded
#[derive(Default)]
pub struct SnapshotReceiver {
    last_applied: HashMap<ConnectionId, SnapshotId>,
}

impl SnapshotReceiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// If `snapshot_id` is not newer than the last snapshot applied from
    /// `connection`, returns that last snapshot id
    pub fn stale_against(&self, connection: &ConnectionId, snapshot_id: &SnapshotId) -> Option<SnapshotId> {
        let last = self.last_applied.get(connection)?;
        if snapshot_id.is_newer_than(last) {
            None
        } else {
            Some(*last)
        }
    }

    pub fn mark_applied(&mut self, connection: ConnectionId, snapshot_id: SnapshotId) {
        self.last_applied.insert(connection, snapshot_id);
    }

    pub fn last_applied(&self, connection: &ConnectionId) -> Option<SnapshotId> {
        self.last_applied.get(connection).copied()
    }

    pub fn remove_connection(&mut self, connection: &ConnectionId) -> bool {
        self.last_applied.remove(connection).is_some()
    }
}
