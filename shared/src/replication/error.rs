use thiserror::Error;

use skein_serde::SerdeErr;

use crate::{ObjectId, Role};

/// Errors that can occur while a Replica handles inbound state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplicationError {
    /// State for an object arrived from a party that is not its authority
    #[error("{object}: refusing state from {role:?}, which is not the authority")]
    NotAuthoritative { object: ObjectId, role: Role },

    /// The payload could not be parsed
    #[error("Malformed payload: {0}")]
    Malformed(#[from] SerdeErr),
}
