// Peer connection: handshake and transaction broadcast

use crate::config::{ClientConfig, Network};
use crate::core::ByteReader;
use crate::error::{Error, Result};
use crate::network::{
    frame, Command, MessageHeader, NetworkAddress, VersionMessage, WireMessage, HEADER_SIZE,
    MAX_PAYLOAD_SIZE, NETWORK_ADDRESS_SIZE,
};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// What the remote node told us in its version message
#[derive(Debug, Clone, Default)]
pub struct PeerInfo {
    pub version: i32,
    pub services: u64,
    pub user_agent: String,
    pub start_height: i32,
    /// Only sent by protocol 70001 and later
    pub relay: Option<bool>,
}

/// Peer connection
pub struct Peer {
    addr: SocketAddr,
    network: Network,
    stream: TcpStream,
    read_timeout: Duration,
    pub info: Option<PeerInfo>,
}

impl Peer {
    /// Connect to a peer, giving up after `config.connect_timeout`
    pub async fn connect(addr: SocketAddr, config: &ClientConfig) -> Result<Self> {
        let stream = timeout(config.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| Error::Timeout(format!("connecting to {}", addr)))??;

        log::info!("Connected to {} ({})", addr, config.network);
        Ok(Self::from_stream(stream, addr, config))
    }

    /// Wrap an already established stream
    pub fn from_stream(stream: TcpStream, addr: SocketAddr, config: &ClientConfig) -> Self {
        Self {
            addr,
            network: config.network,
            stream,
            read_timeout: config.read_timeout,
            info: None,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Frame `payload` under `command` and write it
    pub async fn send(&mut self, command: Command, payload: &[u8]) -> Result<()> {
        let data = frame(self.network.magic(), command.as_str(), payload)?;
        self.stream.write_all(&data).await?;
        self.stream.flush().await?;
        log::debug!("Sent {} ({} byte payload) to {}", command, payload.len(), self.addr);
        Ok(())
    }

    /// Read one frame, checking magic, length and checksum
    pub async fn receive(&mut self) -> Result<WireMessage> {
        let mut header_bytes = [0u8; HEADER_SIZE];
        self.read_exact_timed(&mut header_bytes).await?;

        let header = MessageHeader::parse(&header_bytes)?;
        header.check_magic(self.network.magic())?;
        if header.length > MAX_PAYLOAD_SIZE {
            return Err(Error::Protocol(format!(
                "{} payload of {} bytes exceeds limit",
                header.command, header.length
            )));
        }

        let mut payload = vec![0u8; header.length as usize];
        if !payload.is_empty() {
            self.read_exact_timed(&mut payload).await?;
        }
        header.verify(&payload)?;

        log::debug!("Received {} ({} byte payload) from {}", header.command, payload.len(), self.addr);
        Ok(WireMessage { header, payload })
    }

    async fn read_exact_timed(&mut self, buf: &mut [u8]) -> Result<()> {
        timeout(self.read_timeout, self.stream.read_exact(buf))
            .await
            .map_err(|_| Error::Timeout(format!("reading from {}", self.addr)))??;
        Ok(())
    }

    /// Perform handshake with peer.
    ///
    /// Sends our version, then reads until the peer's version (answered
    /// with verack) and the peer's verack have both arrived.
    pub async fn handshake(&mut self, config: &ClientConfig) -> Result<PeerInfo> {
        let addr_recv = match self.addr {
            SocketAddr::V4(v4) => NetworkAddress::new(*v4.ip(), v4.port(), config.services),
            SocketAddr::V6(_) => {
                return Err(Error::InvalidAddress(format!("{} is not an IPv4 peer", self.addr)));
            }
        };
        let addr_from = NetworkAddress::parse(&config.local_address, config.local_port, config.services)?;

        let version = VersionMessage::new(
            addr_recv,
            addr_from,
            config.protocol_version,
            config.services,
            config.start_height,
        );
        self.send(Command::Version, &version.serialize()).await?;

        let mut their_version = None;
        let mut got_verack = false;

        for _ in 0..config.handshake_frame_limit {
            let message = self.receive().await?;
            match message.command() {
                Command::Version => {
                    let info = parse_peer_version(&message.payload)?;
                    log::info!(
                        "Peer {} runs protocol {} ({}) at height {}",
                        self.addr, info.version, info.user_agent, info.start_height
                    );
                    their_version = Some(info);
                    self.send(Command::Verack, &[]).await?;
                }
                Command::Verack => got_verack = true,
                Command::Ping => self.send(Command::Pong, &message.payload).await?,
                other => log::debug!("Ignoring {} during handshake", other),
            }

            if got_verack {
                if let Some(info) = their_version.clone() {
                    log::info!("Handshake completed with {}", self.addr);
                    self.info = Some(info.clone());
                    return Ok(info);
                }
            }
        }

        Err(Error::Protocol(format!(
            "no version/verack from {} within {} frames",
            self.addr, config.handshake_frame_limit
        )))
    }

    /// Send a signed transaction in a `tx` frame
    pub async fn broadcast_transaction(&mut self, raw_tx: &[u8]) -> Result<()> {
        log::info!("Broadcasting {} byte transaction to {}", raw_tx.len(), self.addr);
        self.send(Command::Tx, raw_tx).await
    }

    /// Read up to `max` follow-up frames, answering pings.
    ///
    /// Stops quietly at the first read timeout or when the peer closes
    /// the connection; returns what was read.
    pub async fn drain(&mut self, max: usize) -> Result<Vec<WireMessage>> {
        let mut received = Vec::new();
        for _ in 0..max {
            let message = match self.receive().await {
                Ok(message) => message,
                Err(Error::Timeout(_)) => break,
                Err(Error::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    log::info!("Peer {} closed the connection", self.addr);
                    break;
                }
                Err(e) => return Err(e),
            };

            match message.command() {
                Command::Ping => self.send(Command::Pong, &message.payload).await?,
                Command::Reject => log::warn!(
                    "Peer {} rejected: {}",
                    self.addr,
                    String::from_utf8_lossy(&message.payload)
                ),
                other => log::info!("Reply from {}: {} {}", self.addr, other, hex::encode(&message.payload)),
            }
            received.push(message);
        }
        Ok(received)
    }
}

/// Pull the fields we report out of a peer version payload.
///
/// The user agent has a variable length and newer peers append a relay
/// byte after the start height, so the payload is read field by field.
fn parse_peer_version(payload: &[u8]) -> Result<PeerInfo> {
    let mut reader = ByteReader::new(payload);
    let version = reader.read_u32_le("peer version")? as i32;
    let services = reader.read_u64_le("peer services")?;
    reader.read_u64_le("peer timestamp")?;
    reader.read_bytes(2 * NETWORK_ADDRESS_SIZE, "peer addresses")?;
    reader.read_u64_le("peer nonce")?;

    let user_agent_len = match reader.read_u8("user agent length")? {
        0xfd => u16::from_le_bytes(reader.read_array("user agent length")?) as usize,
        n if n < 0xfd => n as usize,
        n => {
            return Err(Error::Protocol(format!("user agent length marker {:#04x} too large", n)));
        }
    };
    let user_agent = String::from_utf8_lossy(reader.read_bytes(user_agent_len, "user agent")?).into_owned();
    let start_height = reader.read_u32_le("start height")? as i32;

    let relay = match reader.remaining() {
        0 => None,
        _ => Some(reader.read_u8("relay flag")? != 0),
    };
    if reader.remaining() > 0 {
        log::debug!("Ignoring {} extra bytes in peer version", reader.remaining());
    }

    Ok(PeerInfo {
        version,
        services,
        user_agent,
        start_height,
        relay,
    })
}
