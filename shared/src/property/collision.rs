use crate::{property::error::PropertyTableError, SlotId, SlotKey};

cfg_if! {
    if #[cfg(any(debug_assertions, feature = "collision_check"))]
    {
        use std::collections::HashMap;

        /// Remembers which key produced each registered slot id, so two keys
        /// hashing to the same id are caught at registration instead of
        /// silently sharing a slot
        pub(crate) struct CollisionGuard {
            keys: HashMap<SlotId, SlotKey>,
        }

        impl CollisionGuard {
            pub fn new() -> Self {
                Self {
                    keys: HashMap::new(),
                }
            }

            pub fn check(&mut self, key: &SlotKey) -> Result<SlotId, PropertyTableError> {
                let slot = key.id();
                match self.keys.get(&slot) {
                    Some(existing) if existing != key => Err(PropertyTableError::SlotCollision {
                        slot,
                        existing_key: existing.to_string(),
                        new_key: key.to_string(),
                    }),
                    Some(_) => Ok(slot),
                    None => {
                        self.keys.insert(slot, key.clone());
                        Ok(slot)
                    }
                }
            }

            pub fn forget(&mut self, slot: &SlotId) {
                self.keys.remove(slot);
            }

            pub fn key_of(&self, slot: &SlotId) -> Option<&SlotKey> {
                self.keys.get(slot)
            }
        }
    }
    else
    {
        pub(crate) struct CollisionGuard;

        impl CollisionGuard {
            pub fn new() -> Self {
                Self
            }

            pub fn check(&mut self, key: &SlotKey) -> Result<SlotId, PropertyTableError> {
                Ok(key.id())
            }

            pub fn forget(&mut self, _slot: &SlotId) {}

            pub fn key_of(&self, _slot: &SlotId) -> Option<&SlotKey> {
                None
            }
        }
    }
}
