// Version handshake payload and network address structure

use crate::error::{Error, Result};
use std::net::Ipv4Addr;
use std::time::{SystemTime, UNIX_EPOCH};

/// Encoded size of a network address inside a version message
pub const NETWORK_ADDRESS_SIZE: usize = 26;

/// Encoded size of our version payload
pub const VERSION_PAYLOAD_SIZE: usize = 4 + 8 + 8 + NETWORK_ADDRESS_SIZE * 2 + 8 + 1 + 4;

/// Prefix mapping an IPv4 address into IPv6 space
const IPV4_MAPPED_PREFIX: [u8; 12] = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xff, 0xff];

/// Peer address as carried in a version message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkAddress {
    pub services: u64,
    pub ip: Ipv4Addr,
    pub port: u16,
}

impl NetworkAddress {
    pub fn new(ip: Ipv4Addr, port: u16, services: u64) -> Self {
        Self { services, ip, port }
    }

    /// Parse a dotted IPv4 literal
    pub fn parse(ip: &str, port: u16, services: u64) -> Result<Self> {
        let ip = ip.trim().parse::<Ipv4Addr>()
            .map_err(|e| Error::InvalidAddress(format!("{:?} is not an IPv4 address: {}", ip, e)))?;
        Ok(Self::new(ip, port, services))
    }

    /// services(8, LE) | IPv4-mapped IPv6(16) | port(2, BE)
    pub fn serialize(&self) -> [u8; NETWORK_ADDRESS_SIZE] {
        let mut bytes = [0u8; NETWORK_ADDRESS_SIZE];
        bytes[0..8].copy_from_slice(&self.services.to_le_bytes());
        bytes[8..20].copy_from_slice(&IPV4_MAPPED_PREFIX);
        bytes[20..24].copy_from_slice(&self.ip.octets());
        bytes[24..26].copy_from_slice(&self.port.to_be_bytes());
        bytes
    }
}

/// Build the 26-byte network address structure for an IPv4 literal
pub fn build_network_address(ip: &str, port: u16, services: u64) -> Result<[u8; NETWORK_ADDRESS_SIZE]> {
    Ok(NetworkAddress::parse(ip, port, services)?.serialize())
}

/// Version message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionMessage {
    pub version: i32,
    pub services: u64,
    /// Unix time in seconds
    pub timestamp: u64,
    pub addr_recv: NetworkAddress,
    pub addr_from: NetworkAddress,
    pub nonce: u64,
    pub start_height: i32,
}

impl VersionMessage {
    /// Version message stamped with the current time and a random nonce
    pub fn new(
        addr_recv: NetworkAddress,
        addr_from: NetworkAddress,
        version: i32,
        services: u64,
        start_height: i32,
    ) -> Self {
        Self {
            version,
            services,
            timestamp: unix_time(),
            addr_recv,
            addr_from,
            nonce: rand::random(),
            start_height,
        }
    }

    /// Serialize the payload. The user agent is always empty (a single
    /// zero length byte).
    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(VERSION_PAYLOAD_SIZE);
        bytes.extend_from_slice(&self.version.to_le_bytes());
        bytes.extend_from_slice(&self.services.to_le_bytes());
        bytes.extend_from_slice(&self.timestamp.to_le_bytes());
        bytes.extend_from_slice(&self.addr_recv.serialize());
        bytes.extend_from_slice(&self.addr_from.serialize());
        bytes.extend_from_slice(&self.nonce.to_le_bytes());
        bytes.push(0);
        bytes.extend_from_slice(&self.start_height.to_le_bytes());
        bytes
    }
}

/// Version payload for the handshake, timestamped now with a fresh nonce
pub fn build_version_payload(
    recv: NetworkAddress,
    from: NetworkAddress,
    protocol_version: i32,
    services: u64,
    start_height: i32,
) -> Vec<u8> {
    VersionMessage::new(recv, from, protocol_version, services, start_height).serialize()
}

fn unix_time() -> u64 {
    // A clock before 1970 is reported as the epoch itself
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NODE_NETWORK, PROTOCOL_VERSION};

    #[test]
    fn test_network_address_layout() {
        let bytes = build_network_address("10.0.0.1", 8333, NODE_NETWORK).unwrap();
        assert_eq!(
            hex::encode(bytes),
            "010000000000000000000000000000000000ffff0a000001208d"
        );
    }

    #[test]
    fn test_malformed_ipv4_rejected() {
        for bad in ["", "1.2.3", "256.1.1.1", "a.b.c.d", "::1", "1.2.3.4.5"] {
            let result = build_network_address(bad, 8333, NODE_NETWORK);
            assert!(matches!(result, Err(Error::InvalidAddress(_))), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_version_payload_layout() {
        let recv = NetworkAddress::parse("192.168.1.2", 8333, NODE_NETWORK).unwrap();
        let from = NetworkAddress::parse("127.0.0.1", 8333, NODE_NETWORK).unwrap();
        let msg = VersionMessage {
            version: PROTOCOL_VERSION,
            services: NODE_NETWORK,
            timestamp: 0x5a00_0000,
            addr_recv: recv,
            addr_from: from,
            nonce: 0x0102030405060708,
            start_height: 0,
        };
        let bytes = msg.serialize();

        assert_eq!(bytes.len(), VERSION_PAYLOAD_SIZE);
        assert_eq!(bytes.len(), 85);
        assert_eq!(&bytes[0..4], &[0x62, 0xea, 0x00, 0x00]);
        assert_eq!(&bytes[4..12], &[1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&bytes[12..20], &0x5a00_0000u64.to_le_bytes());
        assert_eq!(&bytes[20..46], &recv.serialize());
        assert_eq!(&bytes[46..72], &from.serialize());
        assert_eq!(&bytes[72..80], &0x0102030405060708u64.to_le_bytes());
        assert_eq!(bytes[80], 0);
        assert_eq!(&bytes[81..85], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_build_version_payload_stamps_time() {
        let addr = NetworkAddress::parse("127.0.0.1", 8333, NODE_NETWORK).unwrap();
        let before = unix_time();
        let payload = build_version_payload(addr, addr, PROTOCOL_VERSION, NODE_NETWORK, 500_000);

        assert_eq!(payload.len(), VERSION_PAYLOAD_SIZE);
        let mut ts = [0u8; 8];
        ts.copy_from_slice(&payload[12..20]);
        assert!(u64::from_le_bytes(ts) >= before);
        assert_eq!(&payload[81..85], &500_000i32.to_le_bytes());
    }
}
