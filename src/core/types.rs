// Basic hash types

use crate::error::{Error, Result};
use std::fmt;

/// RIPEMD160(SHA256(pubkey)), the payload of a P2PKH address
pub type Hash160 = [u8; 20];

/// 256-bit hash type (32 bytes)
///
/// Bytes are kept in internal (wire) order. Transaction ids are
/// conventionally displayed reversed, so the hex conversions flip them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    /// Create a new Hash256 from bytes in internal order
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create from bytes in display (big-endian) order
    pub fn from_display_bytes(mut bytes: [u8; 32]) -> Self {
        bytes.reverse();
        Self(bytes)
    }

    /// Create a Hash256 from a slice in internal order
    pub fn from_slice(slice: &[u8]) -> Result<Self> {
        let bytes: [u8; 32] = slice.try_into().map_err(|_| {
            Error::Encoding(format!("invalid hash length: expected 32, got {}", slice.len()))
        })?;
        Ok(Self(bytes))
    }

    /// Get the hash as a byte slice (internal order)
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Bytes in display order
    pub fn to_display_bytes(&self) -> [u8; 32] {
        let mut reversed = self.0;
        reversed.reverse();
        reversed
    }

    /// Convert to hex string (reversed for display, Bitcoin convention)
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_display_bytes())
    }

    /// Parse a 64-character display-order hex string such as a txid
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let bytes = hex::decode(hex_str.trim())?;
        let display: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            Error::InvalidHex(format!("expected 32-byte hash, got {} bytes", bytes.len()))
        })?;
        Ok(Self::from_display_bytes(display))
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
