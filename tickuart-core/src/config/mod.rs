//! Configuration types
//!
//! Baud rate parameters and receive policy. With the `serde` feature the
//! configuration can be persisted as postcard binary data.

#[cfg(feature = "serde")]
pub mod storage;
pub mod types;

pub use types::*;
