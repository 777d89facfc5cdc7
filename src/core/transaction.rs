// Raw transaction byte layout (one input, one output)

use crate::core::{hash256, Hash256, ByteReader, write_len_prefixed};
use crate::error::{Error, Result};
use std::fmt;

/// Transaction format version
pub const TX_VERSION: u32 = 1;

/// Input sequence number, final
pub const SEQUENCE_FINAL: u32 = 0xffffffff;

/// Lock time, always disabled
pub const LOCK_TIME: u32 = 0;

/// The simplified format carries exactly one input and one output
const INPUT_COUNT: u8 = 1;
const OUTPUT_COUNT: u8 = 1;

/// Serialized transaction.
///
/// An immutable byte buffer in this layout:
///
/// ```text
/// version(4) | 01 | prev hash(32) | prev index(4) | len(1) scriptSig |
/// sequence(4) | 01 | value(8) | len(1) scriptPubKey | locktime(4)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTransaction(Vec<u8>);

impl RawTransaction {
    /// Serialize the fixed layout.
    ///
    /// `prev_tx_hash` is written in internal order, which is the reverse
    /// of the displayed txid. Scripts longer than 255 bytes are rejected.
    pub fn serialize(
        prev_tx_hash: &Hash256,
        prev_index: u32,
        script_sig: &[u8],
        value: u64,
        script_pubkey: &[u8],
    ) -> Result<Self> {
        let mut buf = Vec::with_capacity(4 + 1 + 32 + 4 + 1 + script_sig.len() + 4 + 1 + 8 + 1 + script_pubkey.len() + 4);

        buf.extend_from_slice(&TX_VERSION.to_le_bytes());

        buf.push(INPUT_COUNT);
        buf.extend_from_slice(prev_tx_hash.as_bytes());
        buf.extend_from_slice(&prev_index.to_le_bytes());
        write_len_prefixed(&mut buf, script_sig, "scriptSig")?;
        buf.extend_from_slice(&SEQUENCE_FINAL.to_le_bytes());

        buf.push(OUTPUT_COUNT);
        buf.extend_from_slice(&value.to_le_bytes());
        write_len_prefixed(&mut buf, script_pubkey, "scriptPubKey")?;

        buf.extend_from_slice(&LOCK_TIME.to_le_bytes());

        Ok(Self(buf))
    }

    /// Wrap bytes after checking they follow the layout
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        ParsedTransaction::parse(&bytes)?;
        Ok(Self(bytes))
    }

    /// Decode a hex transaction as printed by `to_hex`
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        Self::from_bytes(hex::decode(hex_str.trim())?)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Transaction id (double SHA256 of the serialized bytes)
    pub fn txid(&self) -> Hash256 {
        hash256(&self.0)
    }

    /// Decode the fields back out of the buffer
    pub fn parse(&self) -> Result<ParsedTransaction> {
        ParsedTransaction::parse(&self.0)
    }
}

impl AsRef<[u8]> for RawTransaction {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for RawTransaction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Fields decoded from a [`RawTransaction`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTransaction {
    pub version: u32,
    /// Hash of the previous transaction (internal order)
    pub prev_tx_hash: Hash256,
    pub prev_index: u32,
    pub script_sig: Vec<u8>,
    pub sequence: u32,
    /// Amount in satoshis
    pub value: u64,
    pub script_pubkey: Vec<u8>,
    pub lock_time: u32,
}

impl ParsedTransaction {
    /// Parse the one-input, one-output layout.
    ///
    /// Other input or output counts, truncated data and trailing bytes
    /// are encoding errors.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(data);

        let version = reader.read_u32_le("version")?;

        let inputs = reader.read_u8("input count")?;
        if inputs != INPUT_COUNT {
            return Err(Error::Encoding(format!("expected 1 input, found {}", inputs)));
        }
        let prev_tx_hash = Hash256::new(reader.read_array("previous tx hash")?);
        let prev_index = reader.read_u32_le("previous output index")?;
        let script_sig = reader.read_len_prefixed("scriptSig")?.to_vec();
        let sequence = reader.read_u32_le("sequence")?;

        let outputs = reader.read_u8("output count")?;
        if outputs != OUTPUT_COUNT {
            return Err(Error::Encoding(format!("expected 1 output, found {}", outputs)));
        }
        let value = reader.read_u64_le("value")?;
        let script_pubkey = reader.read_len_prefixed("scriptPubKey")?.to_vec();

        let lock_time = reader.read_u32_le("lock time")?;
        reader.finish()?;

        Ok(Self {
            version,
            prev_tx_hash,
            prev_index,
            script_sig,
            sequence,
            value,
            script_pubkey,
            lock_time,
        })
    }
}
