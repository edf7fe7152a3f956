use std::sync::{Arc, PoisonError, RwLock};

use skein_serde::{ReadBuffer, Serde, SerdeErr, WriteBuffer};

use crate::{property::error::ApplyError, Role};

/// Which party is allowed to author a slot's value
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Control {
    /// Only the authoritative host writes this slot
    Host,
    /// Only the client writes this slot
    Client,
    /// Either side may write this slot. Inbound writes are always applied
    /// (last write wins), never rejected as conflicting with the local value.
    Shared,
}

impl Control {
    pub fn allows(self, role: Role) -> bool {
        match self {
            Control::Host => role == Role::Host,
            Control::Client => role == Role::Client,
            Control::Shared => true,
        }
    }
}

trait SlotAccessor: Send {
    fn write_value(&self, writer: &mut WriteBuffer) -> Result<(), SerdeErr>;
    fn apply_value(&mut self, reader: &mut ReadBuffer<'_>) -> Result<(), ApplyError>;
    fn type_name(&self) -> &'static str;
}

type Getter<T> = Box<dyn Fn() -> T + Send>;
type Setter<T> = Box<dyn FnMut(T) -> Result<(), ApplyError> + Send>;

struct TypedAccessor<T: Serde> {
    getter: Getter<T>,
    setter: Setter<T>,
}

impl<T: Serde + 'static> SlotAccessor for TypedAccessor<T> {
    fn write_value(&self, writer: &mut WriteBuffer) -> Result<(), SerdeErr> {
        (self.getter)().ser(writer)
    }

    fn apply_value(&mut self, reader: &mut ReadBuffer<'_>) -> Result<(), ApplyError> {
        let value = T::de(reader)?;
        if !reader.is_empty() {
            return Err(ApplyError::TrailingBytes {
                count: reader.remaining(),
            });
        }
        (self.setter)(value)
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// One replicated property of an object: how to read it, how to write it, and
/// who may author it
pub struct PropertyEntry {
    accessor: Box<dyn SlotAccessor>,
    control: Control,
    queryable: bool,
}

impl PropertyEntry {
    /// `getter` must be free of side effects; it is called whenever values are queried
    pub fn new<T, G, S>(control: Control, getter: G, setter: S) -> Self
    where
        T: Serde + 'static,
        G: Fn() -> T + Send + 'static,
        S: FnMut(T) -> Result<(), ApplyError> + Send + 'static,
    {
        Self {
            accessor: Box::new(TypedAccessor {
                getter: Box::new(getter),
                setter: Box::new(setter),
            }),
            control,
            queryable: true,
        }
    }

    /// Entry over one field of an object shared behind an `Arc<RwLock<_>>`
    pub fn shared<O, T>(
        object: &Arc<RwLock<O>>,
        control: Control,
        get: fn(&O) -> T,
        set: fn(&mut O, T),
    ) -> Self
    where
        O: Send + Sync + 'static,
        T: Serde + 'static,
    {
        let reader = object.clone();
        let writer = object.clone();
        Self::new(
            control,
            move || get(&reader.read().unwrap_or_else(PoisonError::into_inner)),
            move |value| {
                let Ok(mut object) = writer.write() else {
                    return Err(ApplyError::rejected("object lock poisoned"));
                };
                set(&mut object, value);
                Ok(())
            },
        )
    }

    /// Exclude this slot from value queries. It is still applied when
    /// received, but never hashed, diffed or authored.
    pub fn not_queryable(mut self) -> Self {
        self.queryable = false;
        self
    }

    pub fn control(&self) -> Control {
        self.control
    }

    pub fn is_queryable(&self) -> bool {
        self.queryable
    }

    pub fn type_name(&self) -> &'static str {
        self.accessor.type_name()
    }

    pub(crate) fn write_value(&self, writer: &mut WriteBuffer) -> Result<(), SerdeErr> {
        self.accessor.write_value(writer)
    }

    pub(crate) fn apply_value(&mut self, bytes: &[u8]) -> Result<(), ApplyError> {
        let mut reader = ReadBuffer::new(bytes);
        self.accessor.apply_value(&mut reader)
    }
}
