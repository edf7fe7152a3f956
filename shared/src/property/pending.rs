use std::collections::{BTreeMap, VecDeque};

use log::debug;

use crate::{property::table::ReadMode, SlotId};

pub(crate) struct PendingValue {
    pub bytes: Vec<u8>,
    pub mode: ReadMode,
}

/// Values received for slots that are not registered yet (e.g. the owning
/// object is still loading). They are applied once the slot is registered.
pub(crate) struct PendingSlots {
    values: BTreeMap<SlotId, PendingValue>,
    arrival_order: VecDeque<SlotId>,
    capacity: usize,
}

impl PendingSlots {
    pub fn new(capacity: usize) -> Self {
        Self {
            values: BTreeMap::new(),
            arrival_order: VecDeque::new(),
            capacity,
        }
    }

    /// Buffer a value, replacing any older value for the same slot.
    /// Returns the slot evicted to make room, if the buffer was full.
    pub fn buffer(&mut self, slot: SlotId, bytes: Vec<u8>, mode: ReadMode) -> Option<SlotId> {
        if self.capacity == 0 {
            return Some(slot);
        }

        if self.values.insert(slot, PendingValue { bytes, mode }).is_some() {
            self.arrival_order.retain(|queued| *queued != slot);
            self.arrival_order.push_back(slot);
            return None;
        }
        self.arrival_order.push_back(slot);

        if self.values.len() <= self.capacity {
            return None;
        }
        let evicted = self.arrival_order.pop_front()?;
        self.values.remove(&evicted);
        Some(evicted)
    }

    pub fn take(&mut self, slot: &SlotId) -> Option<PendingValue> {
        let value = self.values.remove(slot)?;
        self.arrival_order.retain(|queued| queued != slot);
        Some(value)
    }

    pub fn contains(&self, slot: &SlotId) -> bool {
        self.values.contains_key(slot)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

impl Drop for PendingSlots {
    fn drop(&mut self) {
        if !self.values.is_empty() {
            debug!(
                "Discarding {} buffered values for slots that were never registered",
                self.values.len()
            );
        }
    }
}
