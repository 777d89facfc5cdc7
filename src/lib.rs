// Single-input P2PKH transaction signing and Bitcoin wire framing

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod network;
pub mod wallet;

// Re-exports for convenience
pub use cli::{Cli, CliHandler};
pub use config::{ClientConfig, Network};
pub use core::{Hash256, Hash160, RawTransaction, ParsedTransaction, Script};
pub use error::{Error, Result};
pub use network::{frame, build_network_address, build_version_payload, Command, NetworkAddress, Peer, VersionMessage, WireMessage};
pub use wallet::{Address, KeyPair, PrivateKey, UnsignedTransaction, build_raw_transaction, build_script_pubkey, sign_transaction};
