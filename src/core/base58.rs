// Base58Check encoding for addresses and WIF keys

use crate::core::checksum;
use crate::error::{Error, Result};

/// Encode `version ∥ payload ∥ checksum` with the Bitcoin alphabet.
///
/// Leading zero bytes (including a 0x00 version byte) become leading '1'
/// characters.
pub fn encode(version: u8, payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(1 + payload.len() + 4);
    data.push(version);
    data.extend_from_slice(payload);
    let check = checksum(&data);
    data.extend_from_slice(&check);
    bs58::encode(data).with_alphabet(bs58::Alphabet::BITCOIN).into_string()
}

/// Decode a Base58Check string into its version byte and payload.
///
/// The trailing four checksum bytes are verified and stripped.
pub fn decode(s: &str) -> Result<(u8, Vec<u8>)> {
    let data = bs58::decode(s.trim())
        .with_alphabet(bs58::Alphabet::BITCOIN)
        .into_vec()?;

    if data.len() < 5 {
        return Err(Error::Base58(format!("decoded data too short: {} bytes", data.len())));
    }

    let (body, check) = data.split_at(data.len() - 4);
    if checksum(body) != check {
        return Err(Error::ChecksumMismatch);
    }

    Ok((body[0], body[1..].to_vec()))
}
