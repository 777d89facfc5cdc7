// Keys, addresses, transaction building and signing

mod address;
mod keys;
mod tx_builder;
mod signer;

pub use address::{Address, encode_address, decode_address};
pub use keys::{PrivateKey, KeyPair, KeyExport, generate_private_key, derive_public_key, derive_public_key_hash, PUBLIC_KEY_LEN};
pub use tx_builder::{UnsignedTransaction, build_script_pubkey, build_raw_transaction};
pub use signer::{sign_transaction, signature_hash, verify_signed_transaction};
