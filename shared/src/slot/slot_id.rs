use std::fmt;

use skein_serde::{ConstByteLength, ReadBuffer, Serde, SerdeErr, WriteBuffer};

use super::fnv::fnv1a_32;

/// Wire-stable identifier of a replicated slot.
///
/// Computed from a human-readable key, so two independently compiled
/// processes agree on it without exchanging a schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(u32);

impl SlotId {
    pub const fn from_key(key: &str) -> Self {
        Self(fnv1a_32(key.as_bytes()))
    }

    /// Wrap a raw id, as read from the wire
    pub const fn from_raw(value: u32) -> Self {
        Self(value)
    }

    pub const fn value(&self) -> u32 {
        self.0
    }
}

/// Map a slot key such as `"Player.health"` to its [`SlotId`]
pub const fn slot_id(key: &str) -> SlotId {
    SlotId::from_key(key)
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Slot({:#010x})", self.0)
    }
}

impl Serde for SlotId {
    fn ser(&self, writer: &mut WriteBuffer) -> Result<(), SerdeErr> {
        writer.write(&self.0)
    }

    fn de(reader: &mut ReadBuffer<'_>) -> Result<Self, SerdeErr> {
        Ok(Self(reader.read()?))
    }
}

impl ConstByteLength for SlotId {
    fn const_byte_length() -> usize {
        u32::const_byte_length()
    }
}
