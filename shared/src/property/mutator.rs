use std::{
    collections::BTreeSet,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{SlotId, SlotKey};

/// Handle the owning object uses to flag slots whose value it has changed.
///
/// Flags only make a non-forced `query_values` look at a slot again; a
/// forced query re-reads every slot regardless.
#[derive(Clone, Default)]
pub struct SlotMutator {
    dirty: Arc<Mutex<BTreeSet<SlotId>>>,
}

impl SlotMutator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mutate(&self, slot: SlotId) {
        self.lock().insert(slot);
    }

    pub fn mutate_key(&self, key: &SlotKey) {
        self.mutate(key.id());
    }

    pub fn is_dirty(&self, slot: &SlotId) -> bool {
        self.lock().contains(slot)
    }

    pub(crate) fn take(&self) -> BTreeSet<SlotId> {
        std::mem::take(&mut *self.lock())
    }

    pub(crate) fn restore(&self, slots: BTreeSet<SlotId>) {
        self.lock().extend(slots);
    }

    fn lock(&self) -> MutexGuard<'_, BTreeSet<SlotId>> {
        self.dirty.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
