use thiserror::Error;

use skein_serde::SerdeErr;

use crate::SlotId;

/// Errors that can occur while registering slots in a PropertyTable
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropertyTableError {
    /// Two different keys hash to the same slot id; the second registration
    /// would silently receive values meant for the first
    #[error("Slot key `{new_key}` collides with `{existing_key}` (both hash to {slot})")]
    SlotCollision {
        slot: SlotId,
        existing_key: String,
        new_key: String,
    },

    /// The same key appears twice in one schema
    #[error("Slot key `{key}` is registered more than once in the same schema")]
    DuplicateKey { key: String },
}

/// Why an inbound value could not be applied to a slot.
/// Only the one slot is skipped; the rest of the payload is still processed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    /// The slot's setter refused the value
    #[error("Setter rejected value: {reason}")]
    Rejected { reason: String },

    /// The value bytes could not be decoded as the slot's type
    #[error("Could not decode slot value: {0}")]
    Decode(#[from] SerdeErr),

    /// The value decoded, but did not use all of the bytes framed for it
    #[error("{count} unread bytes left after decoding slot value")]
    TrailingBytes { count: usize },
}

impl ApplyError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }
}
