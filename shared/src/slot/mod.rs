mod content_hash;
mod fnv;
mod slot_id;
mod slot_key;

pub use content_hash::ContentHash;
pub use slot_id::{slot_id, SlotId};
pub use slot_key::SlotKey;
