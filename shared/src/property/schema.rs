use crate::{property::entry::PropertyEntry, SlotKey};

/// The full set of slots one object exposes, keyed by their derived keys.
///
/// Built once per object shape and handed to [`PropertyTable::rebuild`].
///
/// [`PropertyTable::rebuild`]: crate::PropertyTable::rebuild
pub struct PropertySchema {
    entries: Vec<(SlotKey, PropertyEntry)>,
}

impl PropertySchema {
    /// Start a schema whose keys are prefixed with `root` (usually the type name)
    pub fn builder(root: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            prefix: SlotKey::new(root),
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &SlotKey> {
        self.entries.iter().map(|(key, _)| key)
    }

    pub(crate) fn into_entries(self) -> Vec<(SlotKey, PropertyEntry)> {
        self.entries
    }
}

pub struct SchemaBuilder {
    prefix: SlotKey,
    entries: Vec<(SlotKey, PropertyEntry)>,
}

impl SchemaBuilder {
    pub fn property(mut self, name: &str, entry: PropertyEntry) -> Self {
        self.entries.push((self.prefix.child(name), entry));
        self
    }

    /// Register the members of a nested structure under `prefix.name.*`
    pub fn nested(mut self, name: &str, build: impl FnOnce(SchemaBuilder) -> SchemaBuilder) -> Self {
        let nested = build(SchemaBuilder {
            prefix: self.prefix.child(name),
            entries: Vec::new(),
        });
        self.entries.extend(nested.entries);
        self
    }

    pub fn build(self) -> PropertySchema {
        PropertySchema {
            entries: self.entries,
        }
    }
}
