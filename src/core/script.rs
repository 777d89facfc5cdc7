// Bitcoin Script building and checking (P2PKH only)

use crate::core::{hash160, Hash160};
use crate::error::{Error, Result};
use secp256k1::{Secp256k1, Message, PublicKey, ecdsa::Signature};

/// Largest data push expressible with a single direct-push opcode
pub const MAX_DIRECT_PUSH: usize = 75;

/// SIGHASH_ALL: the signature commits to the whole transaction
pub const SIGHASH_ALL: u8 = 0x01;

/// Opcodes used by P2PKH scripts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    /// Duplicate the top stack item
    OpDup = 118,
    /// Hash the top stack item with HASH160
    OpHash160 = 169,
    /// Verify that the top two items are equal
    OpEqualVerify = 136,
    /// Check signature
    OpCheckSig = 172,
}

impl OpCode {
    /// Convert byte to opcode
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            118 => Some(OpCode::OpDup),
            169 => Some(OpCode::OpHash160),
            136 => Some(OpCode::OpEqualVerify),
            172 => Some(OpCode::OpCheckSig),
            _ => None,
        }
    }
}

/// Script builder for P2PKH
pub struct Script;

impl Script {
    /// Append `<len> <data>` to a script.
    ///
    /// The length must fit a direct-push opcode; anything larger is
    /// rejected rather than truncated.
    pub fn push_data(script: &mut Vec<u8>, data: &[u8]) -> Result<()> {
        if data.len() > MAX_DIRECT_PUSH {
            return Err(Error::Encoding(format!(
                "push of {} bytes exceeds the {}-byte single-byte push limit",
                data.len(),
                MAX_DIRECT_PUSH
            )));
        }
        script.push(data.len() as u8);
        script.extend_from_slice(data);
        Ok(())
    }

    /// Create a P2PKH scriptPubKey
    /// OP_DUP OP_HASH160 <pubKeyHash> OP_EQUALVERIFY OP_CHECKSIG
    pub fn p2pkh_script_pubkey(pubkey_hash: &Hash160) -> Vec<u8> {
        let mut script = Vec::with_capacity(25);
        script.push(OpCode::OpDup as u8);
        script.push(OpCode::OpHash160 as u8);
        script.push(pubkey_hash.len() as u8);
        script.extend_from_slice(pubkey_hash);
        script.push(OpCode::OpEqualVerify as u8);
        script.push(OpCode::OpCheckSig as u8);
        script
    }

    /// Create a P2PKH scriptSig
    /// <sig+hashtype> <pubkey>
    ///
    /// `der_signature` is the bare DER signature; the sighash byte is
    /// appended inside the first push.
    pub fn p2pkh_script_sig(der_signature: &[u8], sighash_type: u8, pubkey: &[u8]) -> Result<Vec<u8>> {
        let mut sig_with_type = Vec::with_capacity(der_signature.len() + 1);
        sig_with_type.extend_from_slice(der_signature);
        sig_with_type.push(sighash_type);

        let mut script = Vec::with_capacity(sig_with_type.len() + pubkey.len() + 2);
        Self::push_data(&mut script, &sig_with_type)?;
        Self::push_data(&mut script, pubkey)?;
        Ok(script)
    }

    /// Parse scriptSig: <sig+hashtype> <pubkey>
    ///
    /// Returns the DER signature, the sighash byte and the public key.
    pub fn parse_script_sig(script_sig: &[u8]) -> Result<(Vec<u8>, u8, Vec<u8>)> {
        let (sig_with_type, rest) = Self::read_push(script_sig)
            .ok_or_else(|| Error::Encoding("missing signature push".to_string()))?;
        let (pubkey, rest) = Self::read_push(rest)
            .ok_or_else(|| Error::Encoding("missing pubkey push".to_string()))?;

        if !rest.is_empty() {
            return Err(Error::Encoding(format!("{} trailing bytes in scriptSig", rest.len())));
        }

        let (sighash_type, der) = sig_with_type
            .split_last()
            .ok_or_else(|| Error::Encoding("empty signature push".to_string()))?;

        Ok((der.to_vec(), *sighash_type, pubkey.to_vec()))
    }

    /// Parse scriptPubKey: OP_DUP OP_HASH160 <pubKeyHash> OP_EQUALVERIFY OP_CHECKSIG
    pub fn parse_script_pubkey(script_pubkey: &[u8]) -> Result<Hash160> {
        if script_pubkey.len() != 25 {
            return Err(Error::Encoding(format!("invalid scriptPubKey length: {}", script_pubkey.len())));
        }

        let opcodes = [
            (0, OpCode::OpDup),
            (1, OpCode::OpHash160),
            (23, OpCode::OpEqualVerify),
            (24, OpCode::OpCheckSig),
        ];
        for (pos, expected) in opcodes {
            if OpCode::from_byte(script_pubkey[pos]) != Some(expected) {
                return Err(Error::Encoding(format!(
                    "not a P2PKH script: byte {} is {:#04x}, expected {:?}",
                    pos, script_pubkey[pos], expected
                )));
            }
        }
        if script_pubkey[2] != 20 {
            return Err(Error::Encoding(format!(
                "not a P2PKH script: hash push of {} bytes",
                script_pubkey[2]
            )));
        }

        let mut pubkey_hash = [0u8; 20];
        pubkey_hash.copy_from_slice(&script_pubkey[3..23]);
        Ok(pubkey_hash)
    }

    /// Verify a P2PKH spend against a signing hash.
    ///
    /// Checks that the scriptSig pubkey hashes to the locked Hash160 and
    /// that the signature is valid for `sighash`.
    pub fn verify_p2pkh(script_sig: &[u8], script_pubkey: &[u8], sighash: &[u8; 32]) -> Result<bool> {
        let (signature, sighash_type, pubkey) = Self::parse_script_sig(script_sig)?;
        let pubkey_hash = Self::parse_script_pubkey(script_pubkey)?;

        if sighash_type != SIGHASH_ALL {
            return Ok(false);
        }
        if hash160(&pubkey) != pubkey_hash {
            return Ok(false);
        }

        Self::verify_signature(&signature, &pubkey, sighash)
    }

    /// Verify a DER ECDSA signature over a 32-byte digest
    pub fn verify_signature(signature: &[u8], pubkey: &[u8], digest: &[u8; 32]) -> Result<bool> {
        let secp = Secp256k1::verification_only();

        let pubkey = PublicKey::from_slice(pubkey)
            .map_err(|e| Error::Encoding(format!("invalid public key: {}", e)))?;
        let signature = Signature::from_der(signature)
            .map_err(|e| Error::Encoding(format!("invalid signature: {}", e)))?;
        let message = Message::from_digest_slice(digest)
            .map_err(|e| Error::Encoding(format!("invalid message: {}", e)))?;

        Ok(secp.verify_ecdsa(&message, &signature, &pubkey).is_ok())
    }

    fn read_push(data: &[u8]) -> Option<(&[u8], &[u8])> {
        let (&len, rest) = data.split_first()?;
        let len = len as usize;
        if len > MAX_DIRECT_PUSH || rest.len() < len {
            return None;
        }
        Some(rest.split_at(len))
    }
}
