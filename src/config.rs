// Network selection and client settings

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Mainnet magic bytes as they appear on the wire
pub const MAINNET_MAGIC: [u8; 4] = [0xf9, 0xbe, 0xb4, 0xd9];

/// Testnet magic bytes as they appear on the wire
pub const TESTNET_MAGIC: [u8; 4] = [0x0b, 0x11, 0x09, 0x07];

/// Protocol version announced in our version message (0xEA62)
pub const PROTOCOL_VERSION: i32 = 60002;

/// NODE_NETWORK service bit
pub const NODE_NETWORK: u64 = 1;

/// Which chain keys, addresses and frames belong to.
///
/// Passed explicitly to every function that depends on it; the two
/// networks never share prefixes or magic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    /// Pick the network from a `--testnet` style flag
    pub fn from_testnet_flag(testnet: bool) -> Self {
        if testnet { Network::Testnet } else { Network::Mainnet }
    }

    /// Magic value starting every wire frame
    pub fn magic(&self) -> [u8; 4] {
        match self {
            Network::Mainnet => MAINNET_MAGIC,
            Network::Testnet => TESTNET_MAGIC,
        }
    }

    /// Version byte of a P2PKH address
    pub fn address_prefix(&self) -> u8 {
        match self {
            Network::Mainnet => 0x00,
            Network::Testnet => 0x6f,
        }
    }

    /// Version byte of a WIF private key
    pub fn wif_prefix(&self) -> u8 {
        match self {
            Network::Mainnet => 0x80,
            Network::Testnet => 0xef,
        }
    }

    /// Default P2P port
    pub fn default_port(&self) -> u16 {
        match self {
            Network::Mainnet => 8333,
            Network::Testnet => 18333,
        }
    }

    /// Network owning an address version byte, if any
    pub fn from_address_prefix(prefix: u8) -> Option<Self> {
        match prefix {
            0x00 => Some(Network::Mainnet),
            0x6f => Some(Network::Testnet),
            _ => None,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet => write!(f, "testnet"),
        }
    }
}

/// Settings for talking to a remote node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub network: Network,
    /// Version we announce in the handshake
    pub protocol_version: i32,
    /// Service bits we announce
    pub services: u64,
    /// Best height we claim to have
    pub start_height: i32,
    /// Our own IPv4 address as placed in `addr_from`
    pub local_address: String,
    /// Port placed in `addr_from`
    pub local_port: u16,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    /// Frames read while waiting for version + verack before giving up
    pub handshake_frame_limit: usize,
}

impl ClientConfig {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            protocol_version: PROTOCOL_VERSION,
            services: NODE_NETWORK,
            start_height: 0,
            local_address: "127.0.0.1".to_string(),
            local_port: network.default_port(),
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
            handshake_frame_limit: 16,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(Network::Mainnet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_tables() {
        assert_eq!(Network::Mainnet.magic(), [0xf9, 0xbe, 0xb4, 0xd9]);
        assert_eq!(Network::Testnet.magic(), [0x0b, 0x11, 0x09, 0x07]);
        assert_eq!(Network::Mainnet.address_prefix(), 0x00);
        assert_eq!(Network::Testnet.address_prefix(), 0x6f);
        assert_eq!(Network::Mainnet.wif_prefix(), 0x80);
        assert_eq!(Network::Testnet.wif_prefix(), 0xef);
    }

    #[test]
    fn test_from_testnet_flag() {
        assert_eq!(Network::from_testnet_flag(false), Network::Mainnet);
        assert_eq!(Network::from_testnet_flag(true), Network::Testnet);
    }

    #[test]
    fn test_protocol_version_bytes() {
        assert_eq!(PROTOCOL_VERSION.to_le_bytes(), [0x62, 0xea, 0x00, 0x00]);
    }

    #[test]
    fn test_network_serde() {
        let json = serde_json::to_string(&Network::Testnet).unwrap();
        assert_eq!(json, "\"testnet\"");
        let back: Network = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Network::Testnet);
    }

    #[test]
    fn test_client_config_defaults() {
        let config = ClientConfig::new(Network::Testnet);
        assert_eq!(config.local_port, 18333);
        assert_eq!(config.services, NODE_NETWORK);
        assert_eq!(config.start_height, 0);
    }
}
