use std::collections::{BTreeMap, HashSet};

use crate::{
    property::{PropertyTable, SlotValue},
    replication::SnapshotId,
    ConnectionId, ContentHash, SlotId,
};

/// The authored slot values of one object as of the latest snapshot, and
/// which connections have acknowledged all of them
pub struct LocalSnapshotState {
    snapshot_id: Option<SnapshotId>,
    slots: BTreeMap<SlotId, SlotValue>,
    synced: HashSet<ConnectionId>,
}

impl LocalSnapshotState {
    pub fn new() -> Self {
        Self {
            snapshot_id: None,
            slots: BTreeMap::new(),
            synced: HashSet::new(),
        }
    }

    /// Replace the recorded values with the table's current authored
    /// values. Returns whether anything changed; if so, no connection is
    /// considered synced any more.
    pub fn refresh(&mut self, table: &PropertyTable) -> bool {
        let slots: BTreeMap<SlotId, SlotValue> = table
            .authored_values()
            .map(|(slot, value)| (slot, value.clone()))
            .collect();

        let changed = slots != self.slots;
        if changed {
            self.slots = slots;
            self.synced.clear();
        }
        changed
    }

    pub fn snapshot_id(&self) -> Option<SnapshotId> {
        self.snapshot_id
    }

    pub(crate) fn set_snapshot_id(&mut self, snapshot_id: SnapshotId) {
        self.snapshot_id = Some(snapshot_id);
    }

    pub fn hash_of(&self, slot: &SlotId) -> Option<ContentHash> {
        self.slots.get(slot).map(|value| value.hash)
    }

    pub fn value(&self, slot: &SlotId) -> Option<&SlotValue> {
        self.slots.get(slot)
    }

    pub fn slots(&self) -> impl Iterator<Item = (&SlotId, &SlotValue)> {
        self.slots.iter()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    // Synced connections

    pub fn is_synced(&self, connection: &ConnectionId) -> bool {
        self.synced.contains(connection)
    }

    pub fn mark_synced(&mut self, connection: ConnectionId) {
        self.synced.insert(connection);
    }

    pub fn unmark_synced(&mut self, connection: &ConnectionId) {
        self.synced.remove(connection);
    }

    pub fn synced_connections(&self) -> impl Iterator<Item = &ConnectionId> {
        self.synced.iter()
    }
}

impl Default for LocalSnapshotState {
    fn default() -> Self {
        Self::new()
    }
}
