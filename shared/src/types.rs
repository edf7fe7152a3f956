use std::fmt;

use skein_serde::{ConstByteLength, ReadBuffer, Serde, SerdeErr, WriteBuffer};

/// Which side of a session a process (or a peer) is
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Host,
    Client,
}

impl Role {
    pub fn invert(self) -> Self {
        match self {
            Role::Host => Role::Client,
            Role::Client => Role::Host,
        }
    }
}

/// Identifier of a connection, supplied by the transport
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Connection({})", self.0)
    }
}

/// Stable identifier of a networked object, supplied by the object model
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object({})", self.0)
    }
}

impl Serde for ObjectId {
    fn ser(&self, writer: &mut WriteBuffer) -> Result<(), SerdeErr> {
        writer.write(&self.0)
    }

    fn de(reader: &mut ReadBuffer<'_>) -> Result<Self, SerdeErr> {
        Ok(Self(reader.read()?))
    }
}

impl ConstByteLength for ObjectId {
    fn const_byte_length() -> usize {
        u64::const_byte_length()
    }
}

/// The other end of a connection, as described by the transport
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Peer {
    pub id: ConnectionId,
    pub role: Role,
}

impl Peer {
    pub fn new(id: ConnectionId, role: Role) -> Self {
        Self { id, role }
    }

    pub fn host(id: ConnectionId) -> Self {
        Self::new(id, Role::Host)
    }

    pub fn client(id: ConnectionId) -> Self {
        Self::new(id, Role::Client)
    }
}
