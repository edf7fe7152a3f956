use crate::{error::SerdeErr, read_buffer::ReadBuffer, write_buffer::WriteBuffer};

/// A type that can be written to and read back from the wire.
///
/// Values must read back equal to what was written, and two equal values must
/// produce identical bytes: content hashes are computed over this encoding.
pub trait Serde: Sized + Clone + PartialEq {
    /// Append this value's encoding to `writer`
    fn ser(&self, writer: &mut WriteBuffer) -> Result<(), SerdeErr>;

    /// Parse a value from the front of `reader`
    fn de(reader: &mut ReadBuffer<'_>) -> Result<Self, SerdeErr>;
}

/// Types whose encoding always occupies the same number of bytes
pub trait ConstByteLength {
    fn const_byte_length() -> usize;
}
