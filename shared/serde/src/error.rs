use thiserror::Error;

/// Errors that can occur while writing to or reading from a wire buffer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerdeErr {
    /// The payload ended before its own framing said it would.
    /// Recoverable: the message should be dropped, not the connection.
    #[error("Truncated stream: needed {requested} bytes at offset {offset}, but only {remaining} remain")]
    TruncatedStream {
        offset: usize,
        requested: usize,
        remaining: usize,
    },

    /// Growing a WriteBuffer would exceed its configured maximum capacity
    #[error("Write buffer cannot grow to {requested} bytes (maximum capacity is {max_capacity} bytes)")]
    CapacityExceeded {
        requested: usize,
        max_capacity: usize,
    },

    /// A length prefix or bulk-copy range does not fit in the target
    #[error("Length {length} does not fit into {target}")]
    LengthOverflow {
        length: usize,
        target: &'static str,
    },

    /// A string payload was not valid UTF-8
    #[error("String of {length} bytes is not valid UTF-8")]
    InvalidUtf8 { length: usize },

    /// A tag byte (bool / Option) held something other than 0 or 1
    #[error("Invalid {type_name} tag byte {tag}")]
    InvalidTag { type_name: &'static str, tag: u8 },

    /// An enum discriminant did not match any variant
    #[error("Invalid discriminant {value} for enum {enum_name}")]
    InvalidDiscriminant {
        enum_name: &'static str,
        value: i128,
    },
}

impl SerdeErr {
    /// Whether this error only invalidates the message being read
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, SerdeErr::CapacityExceeded { .. })
    }
}
