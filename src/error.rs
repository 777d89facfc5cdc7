// Error types shared by every layer of the crate

use thiserror::Error;

/// Crate-wide error.
///
/// Everything except the transport errors (`Io`, `Protocol`, `Timeout`)
/// comes from pure computation on caller input, so retrying with the same
/// arguments fails the same way.
#[derive(Error, Debug)]
pub enum Error {
    /// Scalar rejected by the curve (zero, >= order, wrong length)
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Base58Check checksum did not match the decoded data
    #[error("checksum mismatch")]
    ChecksumMismatch,

    /// A push or script does not fit its single-byte length prefix,
    /// or a byte layout could not be decoded
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Freshly created signature failed self-verification
    #[error("signing failed: {0}")]
    Signing(String),

    /// Malformed IPv4 literal, bad hash length or wrong network prefix
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid base58: {0}")]
    Base58(String),

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    /// Peer did not connect or answer within the configured timeout
    #[error("timed out {0}")]
    Timeout(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<hex::FromHexError> for Error {
    fn from(e: hex::FromHexError) -> Self {
        Error::InvalidHex(e.to_string())
    }
}

impl From<bs58::decode::Error> for Error {
    fn from(e: bs58::decode::Error) -> Self {
        Error::Base58(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
