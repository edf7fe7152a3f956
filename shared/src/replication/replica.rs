use log::{debug, warn};

use skein_serde::{BufferPool, ReadBuffer, SerdeErr};

use crate::{
    config::ReplicationConfig,
    property::{
        PropertyEntry, PropertySchema, PropertyTable, PropertyTableError, ReadMode, ReadReport,
        SlotFrame,
    },
    replication::{
        AckOutcome, DeltaSnapshot, ReliableChangeTracker, ReplicationError, ReplicationStats,
        SnapshotAck, SnapshotId, SnapshotReceiver, SnapshotSender, SyncState,
    },
    ConnectionId, ObjectId, Peer, Role, SlotId, SlotKey,
};

/// Result of handling an inbound [`DeltaSnapshot`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SnapshotOutcome {
    /// The snapshot was applied. `ack` should be returned to the sender.
    Applied { report: ReadReport, ack: SnapshotAck },
    /// Not newer than the last snapshot applied from this connection
    Stale {
        snapshot_id: SnapshotId,
        last_applied: SnapshotId,
    },
    /// The sender is not this object's authority
    NotAuthoritative { role: Role },
    WrongObject {
        expected: ObjectId,
        received: ObjectId,
    },
    Malformed(SerdeErr),
}

impl SnapshotOutcome {
    pub fn applied(&self) -> Option<&ReadReport> {
        match self {
            SnapshotOutcome::Applied { report, .. } => Some(report),
            _ => None,
        }
    }

    pub fn ack(&self) -> Option<SnapshotAck> {
        match self {
            SnapshotOutcome::Applied { ack, .. } => Some(*ack),
            _ => None,
        }
    }
}

/// Replication state of one networked object: its property table, what
/// every connection has acknowledged, and what has been applied from each
/// connection.
///
/// The authority (by default the host) authors the object's state; inbound
/// snapshots from any other party are refused.
pub struct Replica {
    object: ObjectId,
    authority: Role,
    table: PropertyTable,
    sender: SnapshotSender,
    receiver: SnapshotReceiver,
    reliable: ReliableChangeTracker,
    stats: ReplicationStats,
}

impl Replica {
    pub fn new(object: ObjectId, role: Role, pool: BufferPool) -> Self {
        let config = ReplicationConfig::default();
        Self::from_table(
            PropertyTable::new(object, role, pool),
            config.max_in_flight_snapshots,
        )
    }

    pub fn with_config(object: ObjectId, role: Role, config: &ReplicationConfig) -> Self {
        Self::from_table(
            PropertyTable::with_config(object, role, config),
            config.max_in_flight_snapshots,
        )
    }

    fn from_table(table: PropertyTable, max_in_flight_snapshots: usize) -> Self {
        Self {
            object: table.owner(),
            authority: Role::Host,
            table,
            sender: SnapshotSender::new(max_in_flight_snapshots),
            receiver: SnapshotReceiver::new(),
            reliable: ReliableChangeTracker::new(),
            stats: ReplicationStats::default(),
        }
    }

    /// Make `authority` the only party whose snapshots this replica accepts
    pub fn with_authority(mut self, authority: Role) -> Self {
        self.authority = authority;
        self
    }

    pub fn id(&self) -> ObjectId {
        self.object
    }

    pub fn role(&self) -> Role {
        self.table.role()
    }

    pub fn authority(&self) -> Role {
        self.authority
    }

    pub fn table(&self) -> &PropertyTable {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut PropertyTable {
        &mut self.table
    }

    // Registration

    /// Install a new schema, dropping remote and reliable state kept for
    /// slots that no longer exist
    pub fn rebuild(&mut self, schema: PropertySchema) -> Result<(), PropertyTableError> {
        self.table.rebuild(schema)?;
        self.sender.prune_slots(&self.table);
        let table = &self.table;
        self.reliable.retain(|slot| table.contains(slot));
        Ok(())
    }

    pub fn register_key(&mut self, key: &SlotKey, entry: PropertyEntry) -> Result<SlotId, PropertyTableError> {
        self.table.register_key(key, entry)
    }

    pub fn query_values(&mut self, force: bool) -> Result<Vec<SlotId>, SerdeErr> {
        self.table.query_values(force)
    }

    // Snapshots out

    /// The snapshot to send `connection` this tick, if it is missing anything
    pub fn write_snapshot_state(&mut self, connection: ConnectionId) -> Result<Option<DeltaSnapshot>, SerdeErr> {
        self.sender
            .write_snapshot_state(&mut self.table, connection, &mut self.stats)
    }

    pub fn on_snapshot_ack(&mut self, connection: ConnectionId, snapshot_id: SnapshotId) -> AckOutcome {
        let outcome = self.sender.on_snapshot_ack(connection, snapshot_id);
        if let AckOutcome::Acknowledged { .. } = outcome {
            self.stats.acks_applied += 1;
        }
        outcome
    }

    pub fn sync_state(&self, connection: &ConnectionId) -> SyncState {
        self.sender.sync_state(connection)
    }

    // Snapshots in

    pub fn on_snapshot(&mut self, peer: &Peer, snapshot: &DeltaSnapshot) -> SnapshotOutcome {
        if peer.role != self.authority {
            debug!(
                "{}: refusing snapshot {} from {}, a {:?}",
                self.object, snapshot.snapshot_id, peer.id, peer.role
            );
            self.stats.unauthorized += 1;
            return SnapshotOutcome::NotAuthoritative { role: peer.role };
        }
        if snapshot.object != self.object {
            return SnapshotOutcome::WrongObject {
                expected: self.object,
                received: snapshot.object,
            };
        }
        if let Some(last_applied) = self.receiver.stale_against(&peer.id, &snapshot.snapshot_id) {
            self.stats.stale_discarded += 1;
            return SnapshotOutcome::Stale {
                snapshot_id: snapshot.snapshot_id,
                last_applied,
            };
        }

        let frames: Vec<SlotFrame<'_>> = snapshot
            .slots
            .iter()
            .map(|(slot, bytes)| SlotFrame {
                slot: *slot,
                bytes: bytes.as_slice(),
            })
            .collect();
        let report = self.table.apply_frames(&frames, |_| true, ReadMode::Update);

        self.receiver.mark_applied(peer.id, snapshot.snapshot_id);
        self.stats.snapshots_applied += 1;
        self.stats.count_read(&report);

        SnapshotOutcome::Applied {
            report,
            ack: SnapshotAck::new(self.object, snapshot.snapshot_id),
        }
    }

    /// Decode and apply a snapshot straight off the wire. A payload that
    /// fails to decode is dropped whole.
    pub fn on_snapshot_bytes(&mut self, peer: &Peer, bytes: &[u8]) -> SnapshotOutcome {
        match DeltaSnapshot::decode(bytes) {
            Ok(snapshot) => self.on_snapshot(peer, &snapshot),
            Err(error) => {
                warn!("{}: dropping malformed snapshot from {}: {}", self.object, peer.id, error);
                self.stats.truncated_dropped += 1;
                SnapshotOutcome::Malformed(error)
            }
        }
    }

    /// Apply a full baseline payload from the authority, overwriting every
    /// registered slot it carries
    pub fn on_baseline(&mut self, peer: &Peer, bytes: &[u8]) -> Result<ReadReport, ReplicationError> {
        if peer.role != self.authority {
            self.stats.unauthorized += 1;
            return Err(ReplicationError::NotAuthoritative {
                object: self.object,
                role: peer.role,
            });
        }
        let report = self
            .table
            .read(&mut ReadBuffer::new(bytes), |_| true, ReadMode::Baseline)
            .inspect_err(|_| self.stats.truncated_dropped += 1)?;
        self.stats.count_read(&report);
        Ok(report)
    }

    // Reliable path and full payloads

    /// Authored slots changed since the last reliable flush, or `None` if
    /// nothing changed. Call `query_values` first in the same tick.
    pub fn write_changed(&mut self) -> Result<Option<Vec<u8>>, SerdeErr> {
        let mut out = self.table.pool().acquire_default();
        if self.reliable.write_reliable_changed(&self.table, &mut out)? {
            Ok(Some(out.to_bytes()))
        } else {
            Ok(None)
        }
    }

    /// Every authored slot, queried fresh
    pub fn write_all(&mut self) -> Result<Vec<u8>, SerdeErr> {
        let mut out = self.table.pool().acquire_default();
        self.table.write_all(&mut out)?;
        Ok(out.to_bytes())
    }

    /// Apply a payload produced by `write_changed` or `write_all` on the
    /// other side
    pub fn read<F>(&mut self, bytes: &[u8], filter: F) -> Result<ReadReport, SerdeErr>
    where
        F: FnMut(SlotId) -> bool,
    {
        let report = match self
            .table
            .read(&mut ReadBuffer::new(bytes), filter, ReadMode::Update)
        {
            Ok(report) => report,
            Err(error) => {
                warn!("{}: dropping malformed payload: {}", self.object, error);
                self.stats.truncated_dropped += 1;
                return Err(error);
            }
        };
        self.stats.count_read(&report);
        Ok(report)
    }

    // Connections

    pub fn remove_connection(&mut self, connection: &ConnectionId) -> bool {
        let sent = self.sender.remove_connection(connection);
        let received = self.receiver.remove_connection(connection);
        sent || received
    }

    pub fn connections(&self) -> Vec<ConnectionId> {
        let mut connections: Vec<ConnectionId> = self.sender.connections().copied().collect();
        connections.sort();
        connections
    }

    pub fn sender(&self) -> &SnapshotSender {
        &self.sender
    }

    pub fn stats(&self) -> &ReplicationStats {
        &self.stats
    }
}
