mod collision;
mod entry;
mod error;
mod mutator;
mod payload;
mod pending;
mod schema;
mod table;

pub use entry::{Control, PropertyEntry};
pub use error::{ApplyError, PropertyTableError};
pub use mutator::SlotMutator;
pub use payload::{read_slot_frames, write_slot_frames, SlotFrame};
pub use schema::{PropertySchema, SchemaBuilder};
pub use table::{PropertyTable, ReadMode, ReadReport, SlotValue};
