use std::fmt;

use crate::{error::SerdeErr, pool::BufferPool, serde::Serde};

/// A growable byte buffer for outgoing data.
///
/// Storage starts at the capacity it was acquired with and doubles whenever a
/// write would not fit, up to a hard maximum. Buffers that came from a
/// [`BufferPool`] hand their storage back when dropped.
pub struct WriteBuffer {
    storage: Vec<u8>,
    max_capacity: usize,
    pool: Option<BufferPool>,
}

impl WriteBuffer {
    pub(crate) fn pooled(storage: Vec<u8>, max_capacity: usize, pool: BufferPool) -> Self {
        Self {
            storage,
            max_capacity,
            pool: Some(pool),
        }
    }

    /// Create a buffer that is not attached to any pool
    pub fn unpooled(capacity: usize, max_capacity: usize) -> Self {
        Self {
            storage: Vec::with_capacity(capacity.min(max_capacity)),
            max_capacity,
            pool: None,
        }
    }

    /// Number of bytes written so far (the write cursor)
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    /// Serialize `value` onto the end of the buffer
    pub fn write<T: Serde>(&mut self, value: &T) -> Result<(), SerdeErr> {
        value.ser(self)
    }

    /// Append raw bytes, without any length framing
    pub fn write_array(&mut self, bytes: &[u8]) -> Result<(), SerdeErr> {
        self.reserve(bytes.len())?;
        self.storage.extend_from_slice(bytes);
        Ok(())
    }

    pub fn write_byte(&mut self, byte: u8) -> Result<(), SerdeErr> {
        self.reserve(1)?;
        self.storage.push(byte);
        Ok(())
    }

    /// Write a `u32` length prefix
    pub fn write_len(&mut self, length: usize) -> Result<(), SerdeErr> {
        let Ok(length) = u32::try_from(length) else {
            return Err(SerdeErr::LengthOverflow {
                length,
                target: "u32 length prefix",
            });
        };
        self.write_array(&length.to_le_bytes())
    }

    /// Write a zeroed `u32` and return its position, to be filled in later
    /// with [`WriteBuffer::patch_u32`] once the value is known.
    pub fn write_u32_placeholder(&mut self) -> Result<usize, SerdeErr> {
        let position = self.storage.len();
        self.write_array(&[0; 4])?;
        Ok(position)
    }

    /// Overwrite a previously written `u32`
    pub fn patch_u32(&mut self, position: usize, value: u32) -> Result<(), SerdeErr> {
        let written = self.storage.len();
        let Some(target) = self.storage.get_mut(position..position.saturating_add(4)) else {
            return Err(SerdeErr::TruncatedStream {
                offset: position,
                requested: 4,
                remaining: written.saturating_sub(position),
            });
        };
        target.copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// The written region `[0, len)`
    pub fn as_slice(&self) -> &[u8] {
        &self.storage
    }

    /// An owned copy of the written region, independent of pooled storage
    pub fn to_bytes(&self) -> Vec<u8> {
        self.storage.clone()
    }

    /// Reset the write cursor, keeping the allocation
    pub fn clear(&mut self) {
        self.storage.clear();
    }

    fn reserve(&mut self, additional: usize) -> Result<(), SerdeErr> {
        let Some(required) = self.storage.len().checked_add(additional) else {
            return Err(SerdeErr::CapacityExceeded {
                requested: usize::MAX,
                max_capacity: self.max_capacity,
            });
        };
        if required <= self.storage.capacity() {
            return Ok(());
        }
        if required > self.max_capacity {
            return Err(SerdeErr::CapacityExceeded {
                requested: required,
                max_capacity: self.max_capacity,
            });
        }

        let mut new_capacity = self.storage.capacity().max(1);
        while new_capacity < required {
            new_capacity = new_capacity.saturating_mul(2);
        }
        let new_capacity = new_capacity.min(self.max_capacity);

        self.storage.reserve_exact(new_capacity - self.storage.len());
        Ok(())
    }
}

impl Drop for WriteBuffer {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.release(std::mem::take(&mut self.storage));
        }
    }
}

impl fmt::Debug for WriteBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteBuffer")
            .field("len", &self.storage.len())
            .field("capacity", &self.storage.capacity())
            .field("max_capacity", &self.max_capacity)
            .field("pooled", &self.pool.is_some())
            .finish()
    }
}
