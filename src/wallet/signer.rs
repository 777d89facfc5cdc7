// Transaction signing (legacy SIGHASH_ALL over the single input)

use crate::core::{hash256, Hash256, RawTransaction, Script};
use crate::core::script::SIGHASH_ALL;
use crate::error::{Error, Result};
use crate::wallet::{derive_public_key, PrivateKey, UnsignedTransaction};
use secp256k1::{Secp256k1, Message, PublicKey};

/// Sighash type as appended to the preimage before hashing
const SIGHASH_ALL_MARKER: [u8; 4] = [SIGHASH_ALL, 0, 0, 0];

/// Digest the input signature commits to:
/// hash256(preimage ∥ 01000000)
pub fn signature_hash(unsigned: &UnsignedTransaction) -> Result<Hash256> {
    let preimage = unsigned.preimage()?;

    let mut data = Vec::with_capacity(preimage.len() + SIGHASH_ALL_MARKER.len());
    data.extend_from_slice(preimage.as_bytes());
    data.extend_from_slice(&SIGHASH_ALL_MARKER);

    let sighash = hash256(&data);
    log::trace!("signing preimage ({} bytes): {}", data.len(), hex::encode(&data));
    log::debug!("signature hash {}", hex::encode(sighash.as_bytes()));
    Ok(sighash)
}

/// Sign `unsigned` with `private_key` and return the final transaction.
///
/// The signature is checked against the derived public key before it is
/// used; a failed check means broken key material and is returned as
/// [`Error::Signing`].
pub fn sign_transaction(unsigned: &UnsignedTransaction, private_key: &PrivateKey) -> Result<RawTransaction> {
    let secp = Secp256k1::new();
    let secret_key = private_key.secret_key()?;
    let public_key_bytes = derive_public_key(private_key)?;
    let public_key = PublicKey::from_slice(&public_key_bytes)
        .map_err(|e| Error::KeyDerivation(format!("derived public key rejected: {}", e)))?;

    let sighash = signature_hash(unsigned)?;
    let message = Message::from_digest_slice(sighash.as_bytes())
        .map_err(|e| Error::Signing(format!("invalid message: {}", e)))?;

    // RFC 6979 nonce, low-S
    let signature = secp.sign_ecdsa(&message, &secret_key);
    secp.verify_ecdsa(&message, &signature, &public_key)
        .map_err(|e| Error::Signing(format!("signature failed self-verification: {}", e)))?;

    let der = signature.serialize_der();
    let script_sig = Script::p2pkh_script_sig(&der, SIGHASH_ALL, &public_key_bytes)?;

    let signed = unsigned.build(&script_sig)?;
    log::info!(
        "signed transaction {} ({} bytes, {} satoshis to {})",
        signed.txid(),
        signed.len(),
        unsigned.satoshis,
        unsigned.destination
    );
    Ok(signed)
}

/// Check a signed transaction against the fields it was built from.
///
/// Re-derives the signature hash from `unsigned`, then verifies the
/// scriptSig embedded in `signed` against the locking script. Returns
/// `Ok(false)` for a well-formed but invalid signature.
pub fn verify_signed_transaction(signed: &[u8], unsigned: &UnsignedTransaction) -> Result<bool> {
    let parsed = RawTransaction::from_bytes(signed.to_vec())?.parse()?;
    if unsigned.build(&parsed.script_sig)?.as_bytes() != signed {
        return Ok(false);
    }

    let sighash = signature_hash(unsigned)?;
    Script::verify_p2pkh(&parsed.script_sig, &unsigned.subscript(), sighash.as_bytes())
}
