//! Persistent configuration encoding
//!
//! The configuration is stored as postcard-serialized binary data in a
//! caller-provided buffer (flash page, EEPROM image, register file).

use super::types::UartConfig;

/// Upper bound on the encoded size of a [`UartConfig`]
///
/// Two varint-encoded `u32` (5 bytes each) plus the policy tag.
pub const MAX_ENCODED_SIZE: usize = 11;

/// Errors from saving or loading configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// Output buffer too small for the encoded config
    BufferTooSmall,
    /// Stored bytes are not a valid config
    Corrupt,
}

/// Encode `config` into `buffer`, returning the used prefix
pub fn save<'a>(config: &UartConfig, buffer: &'a mut [u8]) -> Result<&'a mut [u8], StorageError> {
    postcard::to_slice(config, buffer).map_err(|_| StorageError::BufferTooSmall)
}

/// Decode a config previously written by [`save`]
pub fn load(bytes: &[u8]) -> Result<UartConfig, StorageError> {
    postcard::from_bytes(bytes).map_err(|_| StorageError::Corrupt)
}
