use std::fmt;

use super::fnv::fnv1a_64;

/// Hash of a slot's serialized value, used to tell whether two parties hold
/// the same value without comparing the bytes themselves
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash(u64);

impl ContentHash {
    pub fn of(bytes: &[u8]) -> Self {
        Self(fnv1a_64(bytes))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:#018x})", self.0)
    }
}
