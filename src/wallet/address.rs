// P2PKH addresses

use crate::config::Network;
use crate::core::{base58, Hash160};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize, Deserializer, Serializer};
use std::fmt;

/// Encode a Hash160 under an address version byte
pub fn encode_address(hash: &Hash160, version: u8) -> String {
    base58::encode(version, hash)
}

/// Decode an address string into its version byte and Hash160
pub fn decode_address(s: &str) -> Result<(u8, Hash160)> {
    let (version, payload) = base58::decode(s)?;
    let hash: Hash160 = payload.as_slice().try_into().map_err(|_| {
        Error::InvalidAddress(format!("expected 20-byte hash, got {} bytes", payload.len()))
    })?;
    Ok((version, hash))
}

/// Bitcoin P2PKH address bound to one network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    network: Network,
    hash: Hash160,
}

impl Address {
    /// Create address from public key hash
    pub fn from_pubkey_hash(hash: Hash160, network: Network) -> Self {
        Self { network, hash }
    }

    /// Parse an address string, insisting on `network`'s version byte
    pub fn parse(s: &str, network: Network) -> Result<Self> {
        let address = Self::parse_any(s)?;
        if address.network != network {
            return Err(Error::InvalidAddress(format!(
                "{} is a {} address, expected {}",
                s.trim(), address.network, network
            )));
        }
        Ok(address)
    }

    /// Parse an address string for whichever network its prefix names
    pub fn parse_any(s: &str) -> Result<Self> {
        let (version, hash) = decode_address(s)?;
        let network = Network::from_address_prefix(version)
            .ok_or_else(|| Error::InvalidAddress(format!("unknown address version byte {:#04x}", version)))?;
        Ok(Self { network, hash })
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Get pubkey hash from address
    pub fn pubkey_hash(&self) -> &Hash160 {
        &self.hash
    }

    pub fn encode(&self) -> String {
        encode_address(&self.hash, self.network.address_prefix())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::parse_any(&s).map_err(serde::de::Error::custom)
    }
}
