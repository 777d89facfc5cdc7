// Transaction builder for the single-input, single-output format

use crate::core::{Hash256, RawTransaction, Script};
use crate::error::Result;
use crate::wallet::Address;

/// P2PKH locking script for an address:
/// `76 a9 14 <hash160> 88 ac`
pub fn build_script_pubkey(address: &Address) -> Vec<u8> {
    Script::p2pkh_script_pubkey(address.pubkey_hash())
}

/// Serialize a transaction spending `input_tx_hash:input_index` to
/// `destination`.
///
/// `input_tx_hash` is the id as displayed (see [`Hash256::from_hex`]); it
/// is written to the layout in reversed, internal order. `script_sig` is
/// inserted verbatim, so the same function serves both the signing
/// preimage and the final transaction.
pub fn build_raw_transaction(
    input_tx_hash: &Hash256,
    input_index: u32,
    destination: &Address,
    satoshis: u64,
    script_sig: &[u8],
) -> Result<RawTransaction> {
    let script_pubkey = build_script_pubkey(destination);
    RawTransaction::serialize(input_tx_hash, input_index, script_sig, satoshis, &script_pubkey)
}

/// Fields of a transaction awaiting its signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    /// Id of the transaction holding the output being spent
    pub input_tx_hash: Hash256,
    /// Output index within that transaction
    pub input_index: u32,
    pub destination: Address,
    /// Amount sent; whatever the input holds beyond this is the fee
    pub satoshis: u64,
    /// Address whose scriptPubKey locks the spent output. Its script
    /// stands in for the scriptSig while hashing; `None` uses the
    /// destination's script.
    pub locking_address: Option<Address>,
}

impl UnsignedTransaction {
    pub fn new(input_tx_hash: Hash256, input_index: u32, destination: Address, satoshis: u64) -> Self {
        Self {
            input_tx_hash,
            input_index,
            destination,
            satoshis,
            locking_address: None,
        }
    }

    /// Sign against the script of the address that owns the input
    pub fn with_locking_address(mut self, address: Address) -> Self {
        self.locking_address = Some(address);
        self
    }

    /// Script placed in the scriptSig slot of the signing preimage
    pub fn subscript(&self) -> Vec<u8> {
        build_script_pubkey(self.locking_address.as_ref().unwrap_or(&self.destination))
    }

    /// Serialize these fields with the given scriptSig
    pub fn build(&self, script_sig: &[u8]) -> Result<RawTransaction> {
        build_raw_transaction(
            &self.input_tx_hash,
            self.input_index,
            &self.destination,
            self.satoshis,
            script_sig,
        )
    }

    /// Transaction with the subscript in place of the scriptSig
    pub fn preimage(&self) -> Result<RawTransaction> {
        self.build(&self.subscript())
    }
}
