use crate::{error::SerdeErr, serde::Serde};

/// Sequential reader over an existing byte slice
#[derive(Clone, Debug)]
pub struct ReadBuffer<'b> {
    bytes: &'b [u8],
    cursor: usize,
}

impl<'b> ReadBuffer<'b> {
    pub fn new(bytes: &'b [u8]) -> Self {
        Self { bytes, cursor: 0 }
    }

    /// Deserialize the next value
    pub fn read<T: Serde>(&mut self) -> Result<T, SerdeErr> {
        T::de(self)
    }

    pub fn read_byte(&mut self) -> Result<u8, SerdeErr> {
        let [byte] = self.read_fixed::<1>()?;
        Ok(byte)
    }

    /// Borrow the next `count` bytes and advance past them
    pub fn read_bytes(&mut self, count: usize) -> Result<&'b [u8], SerdeErr> {
        let remaining = self.remaining();
        if count > remaining {
            return Err(SerdeErr::TruncatedStream {
                offset: self.cursor,
                requested: count,
                remaining,
            });
        }
        let bytes: &'b [u8] = self.bytes;
        let start = self.cursor;
        self.cursor += count;
        Ok(&bytes[start..self.cursor])
    }

    pub fn read_fixed<const N: usize>(&mut self) -> Result<[u8; N], SerdeErr> {
        let mut output = [0; N];
        output.copy_from_slice(self.read_bytes(N)?);
        Ok(output)
    }

    /// Read a `u32` length prefix
    pub fn read_len(&mut self) -> Result<usize, SerdeErr> {
        let length = u32::from_le_bytes(self.read_fixed::<4>()?);
        usize::try_from(length).map_err(|_| SerdeErr::LengthOverflow {
            length: usize::MAX,
            target: "usize",
        })
    }

    /// Copy `count` bytes into `dest[offset..offset + count]`
    pub fn read_into(&mut self, dest: &mut [u8], offset: usize, count: usize) -> Result<(), SerdeErr> {
        let Some(target) = offset
            .checked_add(count)
            .and_then(|end| dest.get_mut(offset..end))
        else {
            return Err(SerdeErr::LengthOverflow {
                length: count,
                target: "destination buffer",
            });
        };
        target.copy_from_slice(self.read_bytes(count)?);
        Ok(())
    }

    /// Current read cursor
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Logical length of the underlying payload
    pub fn len(&self) -> usize {
        self.bytes.len()
    }
}
