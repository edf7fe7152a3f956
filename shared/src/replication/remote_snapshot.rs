use std::collections::{BTreeMap, VecDeque};

use log::debug;

use crate::{
    replication::{LocalSnapshotState, SnapshotId},
    ContentHash, SlotId,
};

/// The value a connection has confirmed for one slot
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AckedSlot {
    pub hash: ContentHash,
    pub snapshot_id: SnapshotId,
}

/// A snapshot that was sent but not acknowledged yet, with the hash of
/// every slot it carried
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentSnapshot {
    pub snapshot_id: SnapshotId,
    pub slots: BTreeMap<SlotId, ContentHash>,
}

/// What one connection is known to hold for one object.
///
/// A slot is settled once the connection acknowledged its current value and
/// no newer snapshot still in flight carries a different value for it: that
/// snapshot could still be applied on top of the acknowledged one.
pub struct RemoteSnapshotState {
    acked: BTreeMap<SlotId, AckedSlot>,
    in_flight: VecDeque<SentSnapshot>,
    max_in_flight: usize,
    last_acked: Option<SnapshotId>,
}

impl RemoteSnapshotState {
    pub fn new(max_in_flight: usize) -> Self {
        Self {
            acked: BTreeMap::new(),
            in_flight: VecDeque::new(),
            max_in_flight: max_in_flight.max(1),
            last_acked: None,
        }
    }

    // Sent

    pub fn record_sent(&mut self, snapshot_id: SnapshotId, slots: BTreeMap<SlotId, ContentHash>) {
        self.in_flight.push_back(SentSnapshot { snapshot_id, slots });

        while self.in_flight.len() > self.max_in_flight {
            if let Some(forgotten) = self.in_flight.pop_front() {
                debug!(
                    "Forgetting unacknowledged snapshot {}, {} newer snapshots in flight",
                    forgotten.snapshot_id, self.max_in_flight
                );
                self.forget_unacknowledged(&forgotten);
            }
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Whether `snapshot_id` is still waiting for an acknowledgment
    pub fn is_in_flight(&self, snapshot_id: &SnapshotId) -> bool {
        self.in_flight
            .iter()
            .any(|sent| sent.snapshot_id == *snapshot_id)
    }

    // Acked

    /// Apply an acknowledgment of `snapshot_id` and return the record of what
    /// it carried. Older records leave the window with it: the connection
    /// discards those snapshots as stale from now on.
    pub fn acknowledge(&mut self, snapshot_id: SnapshotId) -> Option<SentSnapshot> {
        let position = self
            .in_flight
            .iter()
            .position(|sent| sent.snapshot_id == snapshot_id)?;
        let mut drained: Vec<SentSnapshot> = self.in_flight.drain(..=position).collect();
        let taken = drained.pop()?;

        self.note_acked_snapshot(snapshot_id);
        for (slot, hash) in &taken.slots {
            self.record_ack(*slot, *hash, snapshot_id);
        }
        for older in &drained {
            self.forget_unacknowledged(older);
        }

        Some(taken)
    }

    /// Record `hash` as the value the connection holds for `slot`, unless a
    /// newer acknowledgment for the slot is already known
    pub fn record_ack(&mut self, slot: SlotId, hash: ContentHash, snapshot_id: SnapshotId) -> bool {
        if let Some(existing) = self.acked.get(&slot) {
            if !snapshot_id.is_newer_than(&existing.snapshot_id) {
                return false;
            }
        }
        self.acked.insert(slot, AckedSlot { hash, snapshot_id });
        true
    }

    pub fn note_acked_snapshot(&mut self, snapshot_id: SnapshotId) {
        let newer = self
            .last_acked
            .map_or(true, |last| snapshot_id.is_newer_than(&last));
        if newer {
            self.last_acked = Some(snapshot_id);
        }
    }

    pub fn last_acked(&self) -> Option<SnapshotId> {
        self.last_acked
    }

    pub fn acked(&self, slot: &SlotId) -> Option<&AckedSlot> {
        self.acked.get(slot)
    }

    /// Whether this connection is known to hold `hash` for `slot`
    pub fn is_settled(&self, slot: &SlotId, hash: &ContentHash) -> bool {
        let Some(acked) = self.acked.get(slot) else {
            return false;
        };
        if acked.hash != *hash {
            return false;
        }
        !self.in_flight.iter().any(|sent| {
            sent.snapshot_id.is_newer_than(&acked.snapshot_id)
                && sent.slots.get(slot).is_some_and(|sent_hash| sent_hash != hash)
        })
    }

    /// Slots of `local` whose current value this connection is not known to hold
    pub fn pending_slots(&self, local: &LocalSnapshotState) -> Vec<SlotId> {
        local
            .slots()
            .filter(|(slot, value)| !self.is_settled(slot, &value.hash))
            .map(|(slot, _)| *slot)
            .collect()
    }

    pub fn is_synced(&self, local: &LocalSnapshotState) -> bool {
        local
            .slots()
            .all(|(slot, value)| self.is_settled(slot, &value.hash))
    }

    /// Forget everything about slots `keep` rejects
    pub fn retain_slots(&mut self, mut keep: impl FnMut(&SlotId) -> bool) {
        self.acked.retain(|slot, _| keep(slot));
        for sent in self.in_flight.iter_mut() {
            sent.slots.retain(|slot, _| keep(slot));
        }
    }

    // A snapshot leaving the window unacknowledged may or may not have been
    // applied. Any acknowledged value it could have overwritten is no longer
    // known to be held.
    fn forget_unacknowledged(&mut self, sent: &SentSnapshot) {
        for (slot, hash) in &sent.slots {
            let overwritten = self.acked.get(slot).is_some_and(|acked| {
                sent.snapshot_id.is_newer_than(&acked.snapshot_id) && acked.hash != *hash
            });
            if overwritten {
                self.acked.remove(slot);
            }
        }
    }
}
