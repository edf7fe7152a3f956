use skein_serde::{ConstByteLength, ReadBuffer, SerdeErr, WriteBuffer};

use crate::SlotId;

/// One `(slot id, value bytes)` pair of a slot payload, borrowing the
/// received message
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotFrame<'b> {
    pub slot: SlotId,
    pub bytes: &'b [u8],
}

/// Write `u32 count, count × (u32 slot, u32 len, bytes)`.
/// Returns how many slots were written.
pub fn write_slot_frames<'a, I>(out: &mut WriteBuffer, frames: I) -> Result<usize, SerdeErr>
where
    I: IntoIterator<Item = (SlotId, &'a [u8])>,
{
    let count_position = out.write_u32_placeholder()?;
    let mut count: u32 = 0;

    for (slot, bytes) in frames {
        out.write(&slot)?;
        out.write_len(bytes.len())?;
        out.write_array(bytes)?;
        count += 1;
    }

    out.patch_u32(count_position, count)?;
    Ok(count as usize)
}

/// Parse a whole slot payload before anything is applied, so a truncated
/// message is rejected without side effects
pub fn read_slot_frames<'b>(reader: &mut ReadBuffer<'b>) -> Result<Vec<SlotFrame<'b>>, SerdeErr> {
    let count = reader.read_len()?;

    let frame_header = SlotId::const_byte_length() + u32::const_byte_length();
    let mut frames = Vec::with_capacity(count.min(reader.remaining() / frame_header));

    for _ in 0..count {
        let slot: SlotId = reader.read()?;
        let length = reader.read_len()?;
        let bytes = reader.read_bytes(length)?;
        frames.push(SlotFrame { slot, bytes });
    }

    Ok(frames)
}
