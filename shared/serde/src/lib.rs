//! # Skein Serde
//! Pooled byte buffers and the byte-level wire encoding shared by every part
//! of skein.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod error;
mod impls;
mod pool;
mod read_buffer;
mod repr_enum;
mod serde;
mod write_buffer;

pub use error::SerdeErr;
pub use pool::{BufferPool, BufferPoolConfig, PoolStats};
pub use read_buffer::ReadBuffer;
pub use serde::{ConstByteLength, Serde};
pub use write_buffer::WriteBuffer;
