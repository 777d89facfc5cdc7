// CLI commands

use clap::{Parser, Subcommand};
use crate::config::{ClientConfig, Network};
use crate::core::{Hash256, RawTransaction};
use crate::error::{Error, Result};
use crate::network::Peer;
use crate::wallet::{sign_transaction, Address, KeyPair, PrivateKey, UnsignedTransaction};
use std::net::SocketAddr;

/// Default node to broadcast through
pub const DEFAULT_NODE: &str = "seed.bitcoinstats.com";

#[derive(Parser)]
#[command(name = "rawtx")]
#[command(about = "Generate keys, sign single-input transactions and broadcast them", long_about = None)]
pub struct Cli {
    /// Use testnet prefixes, magic and ports
    #[arg(long, global = true)]
    pub testnet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a new private key and its address
    Keygen {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the address belonging to a WIF private key
    Address {
        /// Private key in Wallet Import Format
        #[arg(long)]
        private_key: String,
    },

    /// Build and sign a one-input, one-output transaction
    Sign {
        /// Private key (WIF) owning the input
        #[arg(long)]
        private_key: String,
        /// Recipient address
        #[arg(long)]
        destination: String,
        /// Id of the transaction holding the unspent output
        #[arg(long)]
        input_transaction: String,
        /// Output index within that transaction
        #[arg(long, default_value = "0")]
        input_index: u32,
        /// Amount to send; the rest of the input goes to fees
        #[arg(long)]
        satoshis: u64,
        /// Address locking the input (defaults to the key's own address)
        #[arg(long)]
        source_address: Option<String>,
    },

    /// Send a signed transaction to a node
    Broadcast {
        /// Signed transaction hex
        #[arg(long)]
        transaction: String,
        /// Node host name or IPv4 address
        #[arg(long, default_value = DEFAULT_NODE)]
        node: String,
        /// Node port (network default when omitted)
        #[arg(long)]
        port: Option<u16>,
        /// Our IPv4 address as announced in the version message
        #[arg(long, default_value = "127.0.0.1")]
        network_address: String,
        /// Replies to wait for after sending
        #[arg(long, default_value = "4")]
        replies: usize,
    },
}

/// CLI handler
pub struct CliHandler {
    network: Network,
}

impl CliHandler {
    pub fn new(network: Network) -> Self {
        Self { network }
    }

    /// Handle CLI command
    pub fn handle(&self, cli: Cli) -> Result<()> {
        match cli.command {
            Commands::Keygen { json } => self.keygen(json),
            Commands::Address { private_key } => self.address(&private_key),
            Commands::Sign {
                private_key,
                destination,
                input_transaction,
                input_index,
                satoshis,
                source_address,
            } => {
                let signed = self.sign(
                    &private_key,
                    &destination,
                    &input_transaction,
                    input_index,
                    satoshis,
                    source_address.as_deref(),
                )?;
                println!("Your final transaction is: {}", signed.to_hex());
                Ok(())
            }
            Commands::Broadcast {
                transaction,
                node,
                port,
                network_address,
                replies,
            } => self.broadcast(&transaction, &node, port, &network_address, replies),
        }
    }

    fn keygen(&self, json: bool) -> Result<()> {
        let keypair = KeyPair::generate(self.network);
        let export = keypair.export();

        if json {
            let text = serde_json::to_string_pretty(&export)
                .map_err(|e| Error::Encoding(format!("failed to serialize key: {}", e)))?;
            println!("{}", text);
        } else {
            println!("Your private key is");
            println!("{}", export.private_key_wif);
            println!("Your address is");
            println!("{}", export.address);
        }
        Ok(())
    }

    fn address(&self, private_key: &str) -> Result<()> {
        let key = PrivateKey::from_wif(private_key, self.network)?;
        let keypair = KeyPair::from_private_key(key, self.network)?;
        println!("{}", keypair.address);
        Ok(())
    }

    /// Parse the user's fields and produce the signed transaction
    pub fn sign(
        &self,
        private_key: &str,
        destination: &str,
        input_transaction: &str,
        input_index: u32,
        satoshis: u64,
        source_address: Option<&str>,
    ) -> Result<RawTransaction> {
        let key = PrivateKey::from_wif(private_key, self.network)?;
        let keypair = KeyPair::from_private_key(key, self.network)?;

        let destination = Address::parse(destination, self.network)?;
        let input_tx_hash = Hash256::from_hex(input_transaction)?;
        let locking_address = match source_address {
            Some(s) => Address::parse(s, self.network)?,
            None => keypair.address,
        };

        if locking_address != keypair.address {
            log::warn!(
                "source address {} does not belong to the signing key ({})",
                locking_address, keypair.address
            );
        }

        let unsigned = UnsignedTransaction::new(input_tx_hash, input_index, destination, satoshis)
            .with_locking_address(locking_address);
        sign_transaction(&unsigned, &keypair.private_key)
    }

    fn broadcast(
        &self,
        transaction: &str,
        node: &str,
        port: Option<u16>,
        network_address: &str,
        replies: usize,
    ) -> Result<()> {
        let raw = RawTransaction::from_hex(transaction)?;

        let mut config = ClientConfig::new(self.network);
        config.local_address = network_address.to_string();
        let port = port.unwrap_or_else(|| self.network.default_port());

        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(async {
            let addr = resolve_ipv4(node, port).await?;
            let mut peer = Peer::connect(addr, &config).await?;
            peer.handshake(&config).await?;
            peer.broadcast_transaction(raw.as_bytes()).await?;
            println!("Sent transaction {} to {}", raw.txid(), addr);
            peer.drain(replies).await?;
            Ok::<(), Error>(())
        })
    }
}

/// First IPv4 address a host name resolves to
async fn resolve_ipv4(host: &str, port: u16) -> Result<SocketAddr> {
    let mut addrs = tokio::net::lookup_host((host, port)).await?;
    addrs
        .find(|a| a.is_ipv4())
        .ok_or_else(|| Error::InvalidAddress(format!("{} has no IPv4 address", host)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::verify_signed_transaction;

    const WIF_ONES: &str = "5HpjE2Hs7vjU4SN3YyPQCdhzCu92WoEeuE6PWNuiPyTu3ESGnzn";
    const TXID: &str = "61ad94e4ad3b0cef86bbab2742f6946534ecbfd82153ce396c723cbbaa2a40fb";

    #[test]
    fn test_parse_sign_command() {
        let cli = Cli::try_parse_from([
            "rawtx", "sign",
            "--private-key", WIF_ONES,
            "--destination", "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa",
            "--input-transaction", TXID,
            "--satoshis", "1000",
        ]).unwrap();

        assert!(!cli.testnet);
        match cli.command {
            Commands::Sign { input_index, satoshis, source_address, .. } => {
                assert_eq!(input_index, 0);
                assert_eq!(satoshis, 1000);
                assert!(source_address.is_none());
            }
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn test_global_testnet_flag() {
        let cli = Cli::try_parse_from(["rawtx", "keygen", "--testnet", "--json"]).unwrap();
        assert!(cli.testnet);
        assert!(matches!(cli.command, Commands::Keygen { json: true }));
    }

    #[test]
    fn test_sign_produces_verifiable_transaction() {
        let handler = CliHandler::new(Network::Mainnet);
        let signed = handler
            .sign(WIF_ONES, "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa", TXID, 1, 1000, None)
            .unwrap();

        let source = Address::parse("1BCwRkTsYzK5aNK4sdF7Bpti3PhrkPtLc4", Network::Mainnet).unwrap();
        let unsigned = UnsignedTransaction::new(
            Hash256::from_hex(TXID).unwrap(),
            1,
            Address::parse("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa", Network::Mainnet).unwrap(),
            1000,
        )
        .with_locking_address(source);

        assert!(verify_signed_transaction(signed.as_bytes(), &unsigned).unwrap());
    }

    #[test]
    fn test_sign_rejects_bad_fields() {
        let handler = CliHandler::new(Network::Mainnet);

        let bad_txid = handler.sign(WIF_ONES, "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa", "abcd", 0, 1, None);
        assert!(matches!(bad_txid, Err(Error::InvalidHex(_))));

        let testnet_dest = handler.sign(WIF_ONES, "mqitioYrN1kLMUngbCDV1k72uPJZe5x22N", TXID, 0, 1, None);
        assert!(matches!(testnet_dest, Err(Error::InvalidAddress(_))));
    }
}
