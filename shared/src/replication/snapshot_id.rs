use std::fmt;

use skein_serde::{ConstByteLength, ReadBuffer, Serde, SerdeErr, WriteBuffer};

use crate::wrapping_number::sequence_greater_than;

/// Per-object sequence number of an emitted snapshot. Wraps around, so
/// ordering must go through [`SnapshotId::is_newer_than`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct SnapshotId(u32);

impl SnapshotId {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    pub fn is_newer_than(&self, other: &SnapshotId) -> bool {
        sequence_greater_than(self.0, other.0)
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl Serde for SnapshotId {
    fn ser(&self, writer: &mut WriteBuffer) -> Result<(), SerdeErr> {
        writer.write(&self.0)
    }

    fn de(reader: &mut ReadBuffer<'_>) -> Result<Self, SerdeErr> {
        Ok(Self(reader.read()?))
    }
}

impl ConstByteLength for SnapshotId {
    fn const_byte_length() -> usize {
        u32::const_byte_length()
    }
}
