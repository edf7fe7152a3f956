use std::collections::{BTreeMap, BTreeSet};

use log::{debug, trace, warn};

use skein_serde::{BufferPool, ReadBuffer, SerdeErr, WriteBuffer};

use crate::{
    config::ReplicationConfig,
    property::{
        collision::CollisionGuard,
        entry::{Control, PropertyEntry},
        error::{ApplyError, PropertyTableError},
        mutator::SlotMutator,
        payload::{read_slot_frames, write_slot_frames, SlotFrame},
        pending::PendingSlots,
        schema::PropertySchema,
    },
    replication::ReliableChangeTracker,
    ContentHash, ObjectId, Role, SlotId, SlotKey,
};

/// The last serialized value of a slot, as seen by the most recent query or
/// the most recent inbound write
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotValue {
    pub hash: ContentHash,
    pub bytes: Vec<u8>,
}

impl SlotValue {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            hash: ContentHash::of(&bytes),
            bytes,
        }
    }
}

/// How an inbound payload should be treated
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadMode {
    /// An incremental update. Values for slots this party exclusively
    /// controls are rejected when they conflict with the local value.
    Update,
    /// A full baseline. Every registered slot is overwritten.
    Baseline,
}

/// What happened to each slot of an inbound payload
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReadReport {
    pub applied: Vec<SlotId>,
    /// Slot not registered yet; the value is held until it is
    pub buffered: Vec<SlotId>,
    /// Slot controlled by this party; the inbound value was refused
    pub rejected: Vec<SlotId>,
    /// Skipped by the caller's filter
    pub filtered: Vec<SlotId>,
    pub failed: Vec<(SlotId, ApplyError)>,
}

impl ReadReport {
    /// Whether every slot was either applied or held for later
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty() && self.failed.is_empty()
    }

    pub fn slot_count(&self) -> usize {
        self.applied.len()
            + self.buffered.len()
            + self.rejected.len()
            + self.filtered.len()
            + self.failed.len()
    }
}

enum Application {
    Applied,
    Unchanged,
    Unauthorized,
    Failed(ApplyError),
}

/// Per-object registry of replicated slots.
///
/// Owns one [`PropertyEntry`] per slot, caches each slot's last serialized
/// value and hash, and buffers inbound values for slots that have not been
/// registered yet.
pub struct PropertyTable {
    owner: ObjectId,
    role: Role,
    pool: BufferPool,
    entries: BTreeMap<SlotId, PropertyEntry>,
    guard: CollisionGuard,
    values: BTreeMap<SlotId, SlotValue>,
    mutator: SlotMutator,
    pending: PendingSlots,
}

impl PropertyTable {
    pub fn new(owner: ObjectId, role: Role, pool: BufferPool) -> Self {
        Self::with_pending_capacity(owner, role, pool, ReplicationConfig::default().max_pending_slots)
    }

    pub fn with_config(owner: ObjectId, role: Role, config: &ReplicationConfig) -> Self {
        Self::with_pending_capacity(owner, role, config.build_pool(), config.max_pending_slots)
    }

    fn with_pending_capacity(
        owner: ObjectId,
        role: Role,
        pool: BufferPool,
        max_pending_slots: usize,
    ) -> Self {
        Self {
            owner,
            role,
            pool,
            entries: BTreeMap::new(),
            guard: CollisionGuard::new(),
            values: BTreeMap::new(),
            mutator: SlotMutator::new(),
            pending: PendingSlots::new(max_pending_slots),
        }
    }

    pub fn owner(&self) -> ObjectId {
        self.owner
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    // Registration

    /// Register `entry` under `slot`, replacing any previous entry.
    /// A value buffered for this slot before registration is applied now.
    pub fn register(&mut self, slot: SlotId, entry: PropertyEntry) {
        if self.entries.insert(slot, entry).is_some() {
            trace!("{}: replaced entry for {}", self.owner, slot);
        }
        self.values.remove(&slot);
        self.mutator.mutate(slot);
        self.apply_pending(slot);
    }

    /// Register `entry` under the id derived from `key`. When collision
    /// checking is active, a key hashing onto a slot owned by a different key
    /// is refused.
    pub fn register_key(&mut self, key: &SlotKey, entry: PropertyEntry) -> Result<SlotId, PropertyTableError> {
        let slot = self.guard.check(key)?;
        self.register(slot, entry);
        Ok(slot)
    }

    pub fn deregister(&mut self, slot: &SlotId) -> Option<PropertyEntry> {
        self.values.remove(slot);
        self.guard.forget(slot);
        self.entries.remove(slot)
    }

    /// Replace every entry with those of `schema`.
    ///
    /// Either the whole schema is installed or, on error, the table is left
    /// untouched. Cached values survive for slots present in both the old and
    /// the new schema. Buffered values are kept and applied to newly
    /// registered slots.
    pub fn rebuild(&mut self, schema: PropertySchema) -> Result<(), PropertyTableError> {
        let mut guard = CollisionGuard::new();
        let mut seen = BTreeSet::new();
        let mut entries = BTreeMap::new();

        for (key, entry) in schema.into_entries() {
            if !seen.insert(key.clone()) {
                return Err(PropertyTableError::DuplicateKey {
                    key: key.to_string(),
                });
            }
            let slot = guard.check(&key)?;
            entries.insert(slot, entry);
        }

        debug!("{}: rebuilt property table with {} slots", self.owner, entries.len());

        self.entries = entries;
        self.guard = guard;
        let entries = &self.entries;
        self.values.retain(|slot, _| entries.contains_key(slot));
        self.mark_all_dirty();

        let slots: Vec<SlotId> = self.entries.keys().copied().collect();
        for slot in slots {
            self.apply_pending(slot);
        }
        Ok(())
    }

    // Change tracking

    /// A handle the owning object keeps to flag changed slots
    pub fn mutator(&self) -> SlotMutator {
        self.mutator.clone()
    }

    pub fn mark_dirty(&self, slot: SlotId) {
        self.mutator.mutate(slot);
    }

    pub fn mark_all_dirty(&self) {
        self.mutator.restore(self.entries.keys().copied().collect());
    }

    /// Read every queryable slot through its getter, refresh the cached
    /// value and hash, and return the slots whose hash changed.
    ///
    /// Without `force`, slots that already have a cached value and were not
    /// flagged through the [`SlotMutator`] are skipped.
    pub fn query_values(&mut self, force: bool) -> Result<Vec<SlotId>, SerdeErr> {
        let dirty = self.mutator.take();
        let mut buffer = self.pool.acquire_default();
        let mut changed = Vec::new();

        for (slot, entry) in &self.entries {
            if !entry.is_queryable() {
                continue;
            }
            if !force && !dirty.contains(slot) && self.values.contains_key(slot) {
                continue;
            }

            buffer.clear();
            if let Err(error) = entry.write_value(&mut buffer) {
                self.mutator.restore(dirty);
                return Err(error);
            }

            let hash = ContentHash::of(buffer.as_slice());
            if self.values.get(slot).map(|value| value.hash) != Some(hash) {
                self.values.insert(
                    *slot,
                    SlotValue {
                        hash,
                        bytes: buffer.to_bytes(),
                    },
                );
                changed.push(*slot);
            }
        }

        if !changed.is_empty() {
            trace!("{}: {} slots changed since last query", self.owner, changed.len());
        }
        Ok(changed)
    }

    /// Whether this party may author `slot`. Unregistered slots are never
    /// controlled.
    pub fn has_control(&self, slot: &SlotId) -> bool {
        self.entries
            .get(slot)
            .is_some_and(|entry| entry.control().allows(self.role))
    }

    /// Cached values of every slot this party authors, in slot order
    pub fn authored_values(&self) -> impl Iterator<Item = (SlotId, &SlotValue)> + '_ {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.is_queryable() && entry.control().allows(self.role))
            .filter_map(|(slot, _)| self.values.get(slot).map(|value| (*slot, value)))
    }

    // Outbound

    /// Query every slot, then write all authored slots as a full payload
    pub fn write_all(&mut self, out: &mut WriteBuffer) -> Result<usize, SerdeErr> {
        self.query_values(true)?;
        write_slot_frames(
            out,
            self.authored_values()
                .map(|(slot, value)| (slot, value.bytes.as_slice())),
        )
    }

    /// Write authored slots whose cached value differs from what `tracker`
    /// last flushed. Writes nothing when no slot changed.
    ///
    /// Uses the cached values as they are: run `query_values` first in the
    /// same tick.
    pub fn write_changed(
        &self,
        out: &mut WriteBuffer,
        tracker: &mut ReliableChangeTracker,
    ) -> Result<usize, SerdeErr> {
        let changed: Vec<(SlotId, &SlotValue)> = self
            .authored_values()
            .filter(|(slot, value)| tracker.differs(slot, &value.hash))
            .collect();
        if changed.is_empty() {
            return Ok(0);
        }

        let written = write_slot_frames(
            out,
            changed
                .iter()
                .map(|(slot, value)| (*slot, value.bytes.as_slice())),
        )?;
        for (slot, value) in changed {
            tracker.mark_flushed(slot, value.hash);
        }
        Ok(written)
    }

    // Inbound

    /// Parse a whole slot payload, then apply every slot `filter` accepts.
    ///
    /// A truncated payload is an `Err` and nothing is applied. A slot that
    /// fails to apply is reported and skipped; the rest are still applied.
    pub fn read<F>(
        &mut self,
        reader: &mut ReadBuffer<'_>,
        filter: F,
        mode: ReadMode,
    ) -> Result<ReadReport, SerdeErr>
    where
        F: FnMut(SlotId) -> bool,
    {
        let frames = read_slot_frames(reader)?;
        Ok(self.apply_frames(&frames, filter, mode))
    }

    pub fn apply_frames<F>(&mut self, frames: &[SlotFrame<'_>], mut filter: F, mode: ReadMode) -> ReadReport
    where
        F: FnMut(SlotId) -> bool,
    {
        let mut report = ReadReport::default();

        for frame in frames {
            let slot = frame.slot;
            if !filter(slot) {
                report.filtered.push(slot);
                continue;
            }

            if !self.entries.contains_key(&slot) {
                self.buffer_unregistered(slot, frame.bytes.to_vec(), mode);
                report.buffered.push(slot);
                continue;
            }

            match self.apply_slot(slot, frame.bytes, mode) {
                Application::Applied | Application::Unchanged => report.applied.push(slot),
                Application::Unauthorized => report.rejected.push(slot),
                Application::Failed(error) => report.failed.push((slot, error)),
            }
        }

        report
    }

    // Accessors

    pub fn value(&self, slot: &SlotId) -> Option<&SlotValue> {
        self.values.get(slot)
    }

    pub fn contains(&self, slot: &SlotId) -> bool {
        self.entries.contains_key(slot)
    }

    pub fn control(&self, slot: &SlotId) -> Option<Control> {
        self.entries.get(slot).map(PropertyEntry::control)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn slots(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.entries.keys().copied()
    }

    /// Number of values held for slots that are not registered yet
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, slot: &SlotId) -> bool {
        self.pending.contains(slot)
    }

    fn apply_slot(&mut self, slot: SlotId, bytes: &[u8], mode: ReadMode) -> Application {
        let Some(entry) = self.entries.get_mut(&slot) else {
            return Application::Failed(ApplyError::rejected("slot is not registered"));
        };

        let hash = ContentHash::of(bytes);
        let exclusively_controlled =
            entry.control() != Control::Shared && entry.control().allows(self.role);
        if mode == ReadMode::Update && exclusively_controlled {
            if self.values.get(&slot).map(|value| value.hash) == Some(hash) {
                return Application::Unchanged;
            }
            debug!(
                "{}: refused inbound value for {} which this {:?} controls",
                self.owner, slot, self.role
            );
            return Application::Unauthorized;
        }

        if let Err(error) = entry.apply_value(bytes) {
            warn!(
                "{}: could not apply value to {} ({}): {}",
                self.owner,
                describe_slot(&self.guard, slot),
                entry.type_name(),
                error
            );
            return Application::Failed(error);
        }

        self.values.insert(
            slot,
            SlotValue {
                hash,
                bytes: bytes.to_vec(),
            },
        );
        Application::Applied
    }

    fn buffer_unregistered(&mut self, slot: SlotId, bytes: Vec<u8>, mode: ReadMode) {
        debug!("{}: holding value for unregistered {}", self.owner, slot);
        if let Some(evicted) = self.pending.buffer(slot, bytes, mode) {
            debug!(
                "{}: pending buffer full, dropped held value for {}",
                self.owner, evicted
            );
        }
    }

    fn apply_pending(&mut self, slot: SlotId) {
        let Some(pending) = self.pending.take(&slot) else {
            return;
        };
        trace!("{}: applying held value for {}", self.owner, slot);
        match self.apply_slot(slot, &pending.bytes, pending.mode) {
            Application::Applied | Application::Unchanged | Application::Failed(_) => {}
            Application::Unauthorized => {
                debug!("{}: discarded held value for controlled {}", self.owner, slot);
            }
        }
    }
}

fn describe_slot(guard: &CollisionGuard, slot: SlotId) -> String {
    match guard.key_of(&slot) {
        Some(key) => format!("{} `{}`", slot, key),
        None => slot.to_string(),
    }
}
