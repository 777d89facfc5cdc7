// Key generation and derivation

use crate::config::Network;
use crate::core::{base58, hash160, Hash160};
use crate::error::{Error, Result};
use crate::wallet::Address;
use secp256k1::{Secp256k1, SecretKey, PublicKey};
use rand::rngs::OsRng;
use serde::Serialize;
use std::fmt;

/// Length of an uncompressed secp256k1 public key (04 ∥ X ∥ Y)
pub const PUBLIC_KEY_LEN: usize = 65;

/// Trailing WIF byte marking a key meant for compressed public keys
const WIF_COMPRESSED_FLAG: u8 = 0x01;

/// Raw 32-byte secp256k1 scalar.
///
/// The bytes are not checked against the curve order until a public key
/// is derived from them.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey([u8; 32]);

impl PrivateKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(slice: &[u8]) -> Result<Self> {
        let bytes: [u8; 32] = slice.try_into().map_err(|_| {
            Error::KeyDerivation(format!("private key must be 32 bytes, got {}", slice.len()))
        })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Wallet Import Format: Base58Check(prefix ∥ key), uncompressed form
    pub fn to_wif(&self, network: Network) -> String {
        base58::encode(network.wif_prefix(), &self.0)
    }

    /// Decode a WIF string for `network`.
    ///
    /// Accepts both the 32-byte form and the 33-byte form carrying the
    /// compressed-pubkey flag; the flag is dropped since keys here always
    /// derive uncompressed public keys.
    pub fn from_wif(wif: &str, network: Network) -> Result<Self> {
        let (version, payload) = base58::decode(wif)?;
        if version != network.wif_prefix() {
            return Err(Error::KeyDerivation(format!(
                "WIF version byte {:#04x} does not belong to {}",
                version, network
            )));
        }

        match payload.len() {
            32 => Self::from_slice(&payload),
            33 if payload[32] == WIF_COMPRESSED_FLAG => {
                log::warn!("WIF key carries the compressed flag; deriving the uncompressed public key");
                Self::from_slice(&payload[..32])
            }
            n => Err(Error::KeyDerivation(format!("invalid WIF payload length: {}", n))),
        }
    }

    /// Curve scalar for signing; fails on zero or out-of-range values
    pub(crate) fn secret_key(&self) -> Result<SecretKey> {
        SecretKey::from_slice(&self.0)
            .map_err(|e| Error::KeyDerivation(format!("invalid secret key: {}", e)))
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PrivateKey(..)")
    }
}

/// Generate 32 uniformly random bytes forming a valid private key.
///
/// Draws from the operating system CSPRNG.
pub fn generate_private_key() -> PrivateKey {
    let secret_key = SecretKey::new(&mut OsRng);
    PrivateKey(secret_key.secret_bytes())
}

/// Uncompressed public key for a private key
pub fn derive_public_key(private_key: &PrivateKey) -> Result<[u8; PUBLIC_KEY_LEN]> {
    let secp = Secp256k1::signing_only();
    let secret_key = private_key.secret_key()?;
    Ok(PublicKey::from_secret_key(&secp, &secret_key).serialize_uncompressed())
}

/// RIPEMD160(SHA256(uncompressed public key))
pub fn derive_public_key_hash(private_key: &PrivateKey) -> Result<Hash160> {
    let pubkey = derive_public_key(private_key)?;
    Ok(hash160(&pubkey))
}

/// Key pair
#[derive(Clone)]
pub struct KeyPair {
    pub private_key: PrivateKey,
    pub public_key: [u8; PUBLIC_KEY_LEN],
    pub address: Address,
}

impl KeyPair {
    /// Generate a new key pair
    pub fn generate(network: Network) -> Self {
        let secp = Secp256k1::signing_only();
        let secret_key = SecretKey::new(&mut OsRng);
        let public_key = PublicKey::from_secret_key(&secp, &secret_key).serialize_uncompressed();
        Self::assemble(PrivateKey(secret_key.secret_bytes()), public_key, network)
    }

    /// Derive the public half from an existing private key
    pub fn from_private_key(private_key: PrivateKey, network: Network) -> Result<Self> {
        let public_key = derive_public_key(&private_key)?;
        Ok(Self::assemble(private_key, public_key, network))
    }

    fn assemble(private_key: PrivateKey, public_key: [u8; PUBLIC_KEY_LEN], network: Network) -> Self {
        let address = Address::from_pubkey_hash(hash160(&public_key), network);
        Self {
            private_key,
            public_key,
            address,
        }
    }

    pub fn network(&self) -> Network {
        self.address.network()
    }

    /// Get pubkey hash
    pub fn pubkey_hash(&self) -> &Hash160 {
        self.address.pubkey_hash()
    }

    pub fn wif(&self) -> String {
        self.private_key.to_wif(self.network())
    }

    /// Printable summary; the WIF is the only form of the secret included
    pub fn export(&self) -> KeyExport {
        KeyExport {
            network: self.network(),
            private_key_wif: self.wif(),
            public_key: hex::encode(self.public_key),
            address: self.address,
        }
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("address", &self.address.to_string())
            .finish_non_exhaustive()
    }
}

/// Serializable key material as printed by `rawtx keygen --json`
#[derive(Debug, Clone, Serialize)]
pub struct KeyExport {
    pub network: Network,
    pub private_key_wif: String,
    pub public_key: String,
    pub address: Address,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_one() -> PrivateKey {
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        PrivateKey::from_bytes(bytes)
    }

    #[test]
    fn test_keypair_generation() {
        let kp = KeyPair::generate(Network::Mainnet);

        assert_eq!(kp.public_key.len(), 65);
        assert_eq!(kp.public_key[0], 0x04);
        assert_eq!(kp.pubkey_hash(), &hash160(&kp.public_key));
        assert!(kp.address.to_string().starts_with('1'));
    }

    #[test]
    fn test_generated_keys_differ() {
        assert_ne!(generate_private_key(), generate_private_key());
    }

    #[test]
    fn test_known_key_one() {
        let kp = KeyPair::from_private_key(key_one(), Network::Mainnet).unwrap();
        assert_eq!(kp.address.to_string(), "1EHNa6Q4Jz2uvNExL497mE43ikXhwF6kZm");
        assert_eq!(kp.wif(), "5HpHagT65TZzG1PH3CSu63k8DbpvD8s5ip4nEB3kEsreAnchuDf");
    }

    #[test]
    fn test_repeated_ones_fixture() {
        let key = PrivateKey::from_bytes([0x01; 32]);

        let pubkey = derive_public_key(&key).unwrap();
        assert_eq!(
            hex::encode(pubkey),
            "041b84c5567b126440995d3ed5aaba0565d71e1834604819ff9c17f5e9d5dd078f\
             70beaf8f588b541507fed6a642c5ab42dfdf8120a7f639de5122d47a69a8e8d1"
        );

        let hash = derive_public_key_hash(&key).unwrap();
        assert_eq!(hex::encode(hash), "6ff3443c994fb2c821969dae53bd5b5052d8394f");

        let mainnet = KeyPair::from_private_key(key.clone(), Network::Mainnet).unwrap();
        assert_eq!(mainnet.address.to_string(), "1BCwRkTsYzK5aNK4sdF7Bpti3PhrkPtLc4");
        assert_eq!(mainnet.wif(), "5HpjE2Hs7vjU4SN3YyPQCdhzCu92WoEeuE6PWNuiPyTu3ESGnzn");

        let testnet = KeyPair::from_private_key(key, Network::Testnet).unwrap();
        assert_eq!(testnet.address.to_string(), "mqitioYrN1kLMUngbCDV1k72uPJZe5x22N");
        assert_eq!(testnet.wif(), "91bMom7Qi9oc2VsLBKHK5EFwrZVjfxmrFAxLb1GDjiCwpGS6u85");
    }

    #[test]
    fn test_invalid_scalars() {
        let zero = PrivateKey::from_bytes([0u8; 32]);
        assert!(matches!(derive_public_key(&zero), Err(Error::KeyDerivation(_))));

        let too_big = PrivateKey::from_bytes([0xff; 32]);
        assert!(matches!(derive_public_key_hash(&too_big), Err(Error::KeyDerivation(_))));

        assert!(matches!(PrivateKey::from_slice(&[1u8; 31]), Err(Error::KeyDerivation(_))));
    }

    #[test]
    fn test_wif_round_trip() {
        let key = generate_private_key();
        for network in [Network::Mainnet, Network::Testnet] {
            let wif = key.to_wif(network);
            assert_eq!(PrivateKey::from_wif(&wif, network).unwrap(), key);
        }
    }

    #[test]
    fn test_wif_compressed_flag() {
        let mut payload = [0x01u8; 33];
        payload[32] = WIF_COMPRESSED_FLAG;
        let wif = base58::encode(0x80, &payload);

        let key = PrivateKey::from_wif(&wif, Network::Mainnet).unwrap();
        assert_eq!(key.as_bytes(), &[0x01; 32]);
    }

    #[test]
    fn test_wif_wrong_network() {
        let wif = key_one().to_wif(Network::Testnet);
        assert!(matches!(PrivateKey::from_wif(&wif, Network::Mainnet), Err(Error::KeyDerivation(_))));
    }

    #[test]
    fn test_debug_hides_secret() {
        let kp = KeyPair::from_private_key(PrivateKey::from_bytes([0x01; 32]), Network::Mainnet).unwrap();
        let shown = format!("{:?} {:?}", kp, kp.private_key);
        assert!(!shown.contains("0101"));
        assert!(!shown.contains(&kp.wif()));
    }

    #[test]
    fn test_export_json() {
        let kp = KeyPair::from_private_key(key_one(), Network::Mainnet).unwrap();
        let json = serde_json::to_value(kp.export()).unwrap();
        assert_eq!(json["network"], "mainnet");
        assert_eq!(json["address"], "1EHNa6Q4Jz2uvNExL497mE43ikXhwF6kZm");
        assert_eq!(json["private_key_wif"], "5HpHagT65TZzG1PH3CSu63k8DbpvD8s5ip4nEB3kEsreAnchuDf");
    }
}
