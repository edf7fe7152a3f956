//! # Skein Shared
//! Slot identity, property tables and the delta snapshot protocol shared by
//! skein hosts & clients.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

#[macro_use]
extern crate cfg_if;

pub use skein_serde::{
    BufferPool, BufferPoolConfig, ConstByteLength, PoolStats, ReadBuffer, Serde, SerdeErr,
    WriteBuffer,
};

mod config;
mod property;
mod replication;
mod slot;
mod types;
mod wrapping_number;

pub use config::ReplicationConfig;
pub use property::{
    read_slot_frames, write_slot_frames, ApplyError, Control, PropertyEntry, PropertySchema,
    PropertyTable, PropertyTableError, ReadMode, ReadReport, SchemaBuilder, SlotFrame,
    SlotMutator, SlotValue,
};
pub use replication::{
    AckOutcome, AckedSlot, DeltaSnapshot, LocalSnapshotState, ReliableChangeTracker,
    RemoteSnapshotState, Replica, ReplicationError, ReplicationStats, SentSnapshot, SnapshotAck,
    SnapshotId, SnapshotOutcome, SnapshotReceiver, SnapshotSender, SyncState,
};
pub use slot::{slot_id, ContentHash, SlotId, SlotKey};
pub use types::{ConnectionId, ObjectId, Peer, Role};
pub use wrapping_number::{sequence_greater_than, sequence_less_than};
