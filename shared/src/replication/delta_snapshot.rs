use std::collections::BTreeMap;

use skein_serde::{BufferPool, ReadBuffer, Serde, SerdeErr, WriteBuffer};

use crate::{
    property::{read_slot_frames, write_slot_frames},
    replication::SnapshotId,
    ObjectId, SlotId,
};

/// The slots of one object a connection has not yet acknowledged, tagged
/// with the snapshot id they were emitted under.
///
/// `u64 object, u32 snapshot_id, u32 count, count × (u32 slot, u32 len, bytes)`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeltaSnapshot {
    pub object: ObjectId,
    pub snapshot_id: SnapshotId,
    pub slots: BTreeMap<SlotId, Vec<u8>>,
}

impl DeltaSnapshot {
    pub fn new(object: ObjectId, snapshot_id: SnapshotId) -> Self {
        Self {
            object,
            snapshot_id,
            slots: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, slot: &SlotId) -> bool {
        self.slots.contains_key(slot)
    }

    /// Serialize into a buffer taken from `pool`
    pub fn encode(&self, pool: &BufferPool) -> Result<Vec<u8>, SerdeErr> {
        let mut writer = pool.acquire_default();
        writer.write(self)?;
        Ok(writer.to_bytes())
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SerdeErr> {
        ReadBuffer::new(bytes).read()
    }
}

impl Serde for DeltaSnapshot {
    fn ser(&self, writer: &mut WriteBuffer) -> Result<(), SerdeErr> {
        writer.write(&self.object)?;
        writer.write(&self.snapshot_id)?;
        write_slot_frames(
            writer,
            self.slots.iter().map(|(slot, bytes)| (*slot, bytes.as_slice())),
        )?;
        Ok(())
    }

    fn de(reader: &mut ReadBuffer<'_>) -> Result<Self, SerdeErr> {
        let object = reader.read()?;
        let snapshot_id = reader.read()?;
        let slots = read_slot_frames(reader)?
            .into_iter()
            .map(|frame| (frame.slot, frame.bytes.to_vec()))
            .collect();
        Ok(Self {
            object,
            snapshot_id,
            slots,
        })
    }
}

/// Sent back by a receiver once it has applied a snapshot
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SnapshotAck {
    pub object: ObjectId,
    pub snapshot_id: SnapshotId,
}

impl SnapshotAck {
    pub fn new(object: ObjectId, snapshot_id: SnapshotId) -> Self {
        Self {
            object,
            snapshot_id,
        }
    }
}

impl Serde for SnapshotAck {
    fn ser(&self, writer: &mut WriteBuffer) -> Result<(), SerdeErr> {
        writer.write(&self.object)?;
        writer.write(&self.snapshot_id)
    }

    fn de(reader: &mut ReadBuffer<'_>) -> Result<Self, SerdeErr> {
        Ok(Self {
            object: reader.read()?,
            snapshot_id: reader.read()?,
        })
    }
}
