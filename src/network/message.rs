// Wire message framing

use crate::core::{checksum, ByteReader};
use crate::error::{Error, Result};
use std::fmt;

/// Size of the fixed frame header
pub const HEADER_SIZE: usize = 24;

/// Width of the NUL-padded command field
pub const COMMAND_SIZE: usize = 12;

/// Upper bound on payloads we send or accept from a peer
pub const MAX_PAYLOAD_SIZE: u32 = 32 * 1024 * 1024;

/// Message commands this crate sends or reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Version,
    Verack,
    Ping,
    Pong,
    Tx,
    Reject,
    Other(String),
}

impl Command {
    pub fn as_str(&self) -> &str {
        match self {
            Command::Version => "version",
            Command::Verack => "verack",
            Command::Ping => "ping",
            Command::Pong => "pong",
            Command::Tx => "tx",
            Command::Reject => "reject",
            Command::Other(name) => name,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "version" => Command::Version,
            "verack" => Command::Verack,
            "ping" => Command::Ping,
            "pong" => Command::Pong,
            "tx" => Command::Tx,
            "reject" => Command::Reject,
            other => Command::Other(other.to_string()),
        }
    }

    /// Command name padded with NUL bytes (or cut) to 12 bytes
    pub fn to_bytes(&self) -> [u8; COMMAND_SIZE] {
        command_bytes(self.as_str())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn command_bytes(command: &str) -> [u8; COMMAND_SIZE] {
    let mut bytes = [0u8; COMMAND_SIZE];
    let name = command.as_bytes();
    let len = name.len().min(COMMAND_SIZE);
    bytes[..len].copy_from_slice(&name[..len]);
    bytes
}

/// Wrap a payload in a wire frame:
/// magic(4) | command(12) | length(4, LE) | checksum(4) | payload
///
/// Payloads over [`MAX_PAYLOAD_SIZE`] are an `Encoding` error.
pub fn frame(magic: [u8; 4], command: &str, payload: &[u8]) -> Result<Vec<u8>> {
    let length = u32::try_from(payload.len())
        .ok()
        .filter(|len| *len <= MAX_PAYLOAD_SIZE)
        .ok_or_else(|| {
            Error::Encoding(format!(
                "{} payload of {} bytes exceeds the {}-byte frame limit",
                command,
                payload.len(),
                MAX_PAYLOAD_SIZE
            ))
        })?;

    let mut bytes = Vec::with_capacity(HEADER_SIZE + payload.len());
    bytes.extend_from_slice(&magic);
    bytes.extend_from_slice(&command_bytes(command));
    bytes.extend_from_slice(&length.to_le_bytes());
    bytes.extend_from_slice(&checksum(payload));
    bytes.extend_from_slice(payload);
    Ok(bytes)
}

/// Decoded frame header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    pub magic: [u8; 4],
    pub command: Command,
    pub length: u32,
    pub checksum: [u8; 4],
}

impl MessageHeader {
    /// Parse the first 24 bytes of a frame
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(data);
        let magic = reader.read_array("magic")?;
        let raw_command: [u8; COMMAND_SIZE] = reader.read_array("command")?;
        let length = reader.read_u32_le("payload length")?;
        let checksum = reader.read_array("checksum")?;

        let name_len = raw_command.iter().position(|b| *b == 0).unwrap_or(COMMAND_SIZE);
        if raw_command[name_len..].iter().any(|b| *b != 0) {
            return Err(Error::Protocol("command has bytes after NUL padding".to_string()));
        }
        let name = std::str::from_utf8(&raw_command[..name_len])
            .map_err(|e| Error::Protocol(format!("invalid command name: {}", e)))?;

        Ok(Self {
            magic,
            command: Command::parse(name),
            length,
            checksum,
        })
    }

    /// Check that the frame was sent on `magic`'s network
    pub fn check_magic(&self, magic: [u8; 4]) -> Result<()> {
        if self.magic != magic {
            return Err(Error::Protocol(format!(
                "unexpected network magic {}, expected {}",
                hex::encode(self.magic),
                hex::encode(magic)
            )));
        }
        Ok(())
    }

    /// Check length and checksum against the payload actually received
    pub fn verify(&self, payload: &[u8]) -> Result<()> {
        if payload.len() != self.length as usize {
            return Err(Error::Encoding(format!(
                "{} payload is {} bytes, header says {}",
                self.command,
                payload.len(),
                self.length
            )));
        }
        if checksum(payload) != self.checksum {
            return Err(Error::ChecksumMismatch);
        }
        Ok(())
    }
}

/// A complete frame received from a peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireMessage {
    pub header: MessageHeader,
    pub payload: Vec<u8>,
}

impl WireMessage {
    /// Parse and verify one whole frame
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::Encoding(format!("frame too short: {} bytes", data.len())));
        }
        let header = MessageHeader::parse(&data[..HEADER_SIZE])?;
        let payload = data[HEADER_SIZE..].to_vec();
        header.verify(&payload)?;
        Ok(Self { header, payload })
    }

    pub fn command(&self) -> &Command {
        &self.header.command
    }

    /// Re-encode the frame
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        frame(self.header.magic, self.header.command.as_str(), &self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAINNET_MAGIC;
    use crate::core::hash256;

    #[test]
    fn test_command_conversion() {
        assert_eq!(Command::Version.as_str(), "version");
        assert_eq!(Command::parse("verack"), Command::Verack);
        assert_eq!(Command::parse("inv"), Command::Other("inv".to_string()));
        assert_eq!(&Command::Tx.to_bytes(), b"tx\0\0\0\0\0\0\0\0\0\0");
    }

    #[test]
    fn test_frame_layout() {
        let payload = b"hello payload".to_vec();
        let bytes = frame(MAINNET_MAGIC, "version", &payload).unwrap();

        assert_eq!(bytes.len(), HEADER_SIZE + payload.len());
        assert_eq!(&bytes[0..4], &[0xf9, 0xbe, 0xb4, 0xd9]);
        assert_eq!(&bytes[4..16], b"version\0\0\0\0\0");
        assert_eq!(&bytes[16..20], &(payload.len() as u32).to_le_bytes());
        assert_eq!(&bytes[20..24], &hash256(&payload).as_bytes()[..4]);
        assert_eq!(&bytes[24..], &payload[..]);
    }

    #[test]
    fn test_verack_frame() {
        let bytes = frame(MAINNET_MAGIC, "verack", &[]).unwrap();
        assert_eq!(
            hex::encode(bytes),
            "f9beb4d976657261636b000000000000000000005df6e0e2"
        );
    }

    #[test]
    fn test_long_command_truncated() {
        let bytes = frame(MAINNET_MAGIC, "averyverylongcommand", &[]).unwrap();
        assert_eq!(&bytes[4..16], b"averyverylon");
        assert_eq!(bytes.len(), HEADER_SIZE);
    }

    #[test]
    fn test_frame_integrity_for_various_payloads() {
        for size in [0usize, 1, 85, 1000, 70_000] {
            let payload: Vec<u8> = (0..size).map(|i| (i * 31 % 251) as u8).collect();
            let message = WireMessage::parse(&frame(MAINNET_MAGIC, "tx", &payload).unwrap()).unwrap();

            assert_eq!(message.header.length as usize, size);
            assert_eq!(message.header.checksum, checksum(&payload));
            assert_eq!(message.command(), &Command::Tx);
            assert_eq!(message.payload, payload);
        }
    }

    #[test]
    fn test_corrupted_payload_rejected() {
        let mut bytes = frame(MAINNET_MAGIC, "tx", &[1, 2, 3, 4]).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        assert!(matches!(WireMessage::parse(&bytes), Err(Error::ChecksumMismatch)));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let mut bytes = frame(MAINNET_MAGIC, "tx", &[1, 2, 3, 4]).unwrap();
        bytes.push(5);
        assert!(matches!(WireMessage::parse(&bytes), Err(Error::Encoding(_))));
    }

    #[test]
    fn test_check_magic() {
        let bytes = frame(MAINNET_MAGIC, "ping", &[0u8; 8]).unwrap();
        let header = MessageHeader::parse(&bytes[..HEADER_SIZE]).unwrap();
        assert!(header.check_magic(MAINNET_MAGIC).is_ok());
        assert!(header.check_magic([0x0b, 0x11, 0x09, 0x07]).is_err());
    }

    #[test]
    fn test_garbage_after_padding_rejected() {
        let mut bytes = frame(MAINNET_MAGIC, "tx", &[]).unwrap();
        bytes[10] = b'x';
        assert!(matches!(MessageHeader::parse(&bytes[..HEADER_SIZE]), Err(Error::Protocol(_))));
    }

    #[test]
    fn test_reencode() {
        let bytes = frame(MAINNET_MAGIC, "pong", &7u64.to_le_bytes()).unwrap();
        assert_eq!(WireMessage::parse(&bytes).unwrap().to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_oversized_payload_rejected() {
        let payload = vec![0u8; MAX_PAYLOAD_SIZE as usize + 1];
        assert!(matches!(frame(MAINNET_MAGIC, "tx", &payload), Err(Error::Encoding(_))));

        let at_limit = frame(MAINNET_MAGIC, "tx", &payload[..MAX_PAYLOAD_SIZE as usize]).unwrap();
        assert_eq!(&at_limit[16..20], &MAX_PAYLOAD_SIZE.to_le_bytes());
    }
}
