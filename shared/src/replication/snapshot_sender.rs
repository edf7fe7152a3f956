use std::collections::{BTreeMap, HashMap};

use log::{debug, trace};

use skein_serde::SerdeErr;

use crate::{
    property::PropertyTable,
    replication::{
        DeltaSnapshot, LocalSnapshotState, RemoteSnapshotState, ReplicationStats, SnapshotId,
    },
    ConnectionId, SlotId,
};

/// How far a connection is from holding an object's current state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncState {
    /// Nothing has been sent to this connection yet
    Unknown,
    /// Some slot's current value is not acknowledged
    Partial,
    /// Every authored slot's current value is acknowledged
    Synced,
}

/// Result of handling a snapshot acknowledgment
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AckOutcome {
    Acknowledged {
        /// Slots whose current value is now confirmed
        acknowledged: usize,
        /// Slots still waiting for a matching acknowledgment
        pending: usize,
        synced: bool,
    },
    UnknownConnection,
    /// Never sent, already acknowledged, or pushed out of the in-flight window
    UnknownSnapshot,
}

/// Outbound half of the delta snapshot protocol for one object
pub struct SnapshotSender {
    local: LocalSnapshotState,
    remotes: HashMap<ConnectionId, RemoteSnapshotState>,
    last_snapshot_id: SnapshotId,
    max_in_flight: usize,
}

impl SnapshotSender {
    pub fn new(max_in_flight: usize) -> Self {
        Self {
            local: LocalSnapshotState::new(),
            remotes: HashMap::new(),
            last_snapshot_id: SnapshotId::default(),
            max_in_flight,
        }
    }

    pub fn local(&self) -> &LocalSnapshotState {
        &self.local
    }

    pub fn last_snapshot_id(&self) -> SnapshotId {
        self.last_snapshot_id
    }

    /// Build the snapshot `connection` needs, or `None` if it already holds
    /// every authored value.
    ///
    /// A connection with no state yet gets a baseline of every authored
    /// slot. Otherwise only slots whose current hash it has not acknowledged
    /// are included. A snapshot id is only allocated for a snapshot that is
    /// returned.
    pub fn write_snapshot_state(
        &mut self,
        table: &mut PropertyTable,
        connection: ConnectionId,
        stats: &mut ReplicationStats,
    ) -> Result<Option<DeltaSnapshot>, SerdeErr> {
        table.query_values(true)?;
        if self.local.refresh(table) {
            trace!("{}: local snapshot state changed", table.owner());
        }

        let baseline = !self.remotes.contains_key(&connection);
        let max_in_flight = self.max_in_flight;
        let remote = self
            .remotes
            .entry(connection)
            .or_insert_with(|| RemoteSnapshotState::new(max_in_flight));

        let slots: Vec<SlotId> = if baseline {
            self.local.slots().map(|(slot, _)| *slot).collect()
        } else {
            remote.pending_slots(&self.local)
        };

        if slots.is_empty() {
            self.local.mark_synced(connection);
            return Ok(None);
        }

        let snapshot_id = self.last_snapshot_id.next();
        self.last_snapshot_id = snapshot_id;
        self.local.set_snapshot_id(snapshot_id);
        self.local.unmark_synced(&connection);

        let mut snapshot = DeltaSnapshot::new(table.owner(), snapshot_id);
        let mut sent = BTreeMap::new();
        for slot in slots {
            if let Some(value) = self.local.value(&slot) {
                snapshot.slots.insert(slot, value.bytes.clone());
                sent.insert(slot, value.hash);
            }
        }
        remote.record_sent(snapshot_id, sent);

        if baseline {
            stats.baselines_sent += 1;
            debug!(
                "{}: baseline {} to {} with {} slots",
                table.owner(),
                snapshot_id,
                connection,
                snapshot.len()
            );
        } else {
            stats.deltas_sent += 1;
            trace!(
                "{}: delta {} to {} with {} slots",
                table.owner(),
                snapshot_id,
                connection,
                snapshot.len()
            );
        }
        stats.slots_sent += snapshot.len() as u64;

        Ok(Some(snapshot))
    }

    /// Record that `connection` applied `snapshot_id`.
    ///
    /// A slot only counts as acknowledged if the value that snapshot carried
    /// is still the current local value and no newer snapshot in flight
    /// carries a different one.
    pub fn on_snapshot_ack(&mut self, connection: ConnectionId, snapshot_id: SnapshotId) -> AckOutcome {
        let Some(remote) = self.remotes.get_mut(&connection) else {
            debug!("Ignoring ack {} from unknown {}", snapshot_id, connection);
            return AckOutcome::UnknownConnection;
        };
        let Some(sent) = remote.acknowledge(snapshot_id) else {
            debug!("Ignoring ack for unknown snapshot {} from {}", snapshot_id, connection);
            return AckOutcome::UnknownSnapshot;
        };

        let acknowledged = sent
            .slots
            .iter()
            .filter(|(slot, hash)| {
                self.local.hash_of(slot) == Some(**hash) && remote.is_settled(slot, hash)
            })
            .count();

        let pending = remote.pending_slots(&self.local).len();
        let synced = pending == 0;
        if synced {
            self.local.mark_synced(connection);
        } else {
            self.local.unmark_synced(&connection);
        }

        AckOutcome::Acknowledged {
            acknowledged,
            pending,
            synced,
        }
    }

    /// Based on the values of the latest `write_snapshot_state`
    pub fn sync_state(&self, connection: &ConnectionId) -> SyncState {
        match self.remotes.get(connection) {
            None => SyncState::Unknown,
            Some(remote) if remote.is_synced(&self.local) => SyncState::Synced,
            Some(_) => SyncState::Partial,
        }
    }

    pub fn remote(&self, connection: &ConnectionId) -> Option<&RemoteSnapshotState> {
        self.remotes.get(connection)
    }

    pub fn remove_connection(&mut self, connection: &ConnectionId) -> bool {
        self.local.unmark_synced(connection);
        self.remotes.remove(connection).is_some()
    }

    pub fn connections(&self) -> impl Iterator<Item = &ConnectionId> {
        self.remotes.keys()
    }

    /// Forget remote state for slots no longer in `table`
    pub fn prune_slots(&mut self, table: &PropertyTable) {
        for remote in self.remotes.values_mut() {
            remote.retain_slots(|slot| table.contains(slot));
        }
    }
}
