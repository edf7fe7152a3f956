use std::collections::BTreeMap;

use skein_serde::{SerdeErr, WriteBuffer};

use crate::{property::PropertyTable, ContentHash, SlotId};

/// Last value the reliable change path flushed for each slot.
///
/// Independent of snapshot acknowledgment: the transport carrying this path
/// guarantees delivery, so a flushed value is never re-sent.
#[derive(Default)]
pub struct ReliableChangeTracker {
    flushed: BTreeMap<SlotId, ContentHash>,
}

impl ReliableChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn differs(&self, slot: &SlotId, hash: &ContentHash) -> bool {
        self.flushed.get(slot) != Some(hash)
    }

    pub fn mark_flushed(&mut self, slot: SlotId, hash: ContentHash) {
        self.flushed.insert(slot, hash);
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&SlotId) -> bool) {
        self.flushed.retain(|slot, _| keep(slot));
    }

    /// Forget every flushed value, so the next flush writes every slot again
    pub fn reset(&mut self) {
        self.flushed.clear();
    }

    /// Write every authored slot of `table` whose cached value differs from
    /// the one last flushed. Returns whether anything was written.
    pub fn write_reliable_changed(&mut self, table: &PropertyTable, out: &mut WriteBuffer) -> Result<bool, SerdeErr> {
        Ok(table.write_changed(out, self)? > 0)
    }
}
