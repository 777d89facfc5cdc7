// P2P wire framing and peer transport

mod message;
mod version;
mod peer;

pub use message::{frame, Command, MessageHeader, WireMessage, HEADER_SIZE, COMMAND_SIZE, MAX_PAYLOAD_SIZE};
pub use version::{build_network_address, build_version_payload, NetworkAddress, VersionMessage, NETWORK_ADDRESS_SIZE, VERSION_PAYLOAD_SIZE};
pub use peer::{Peer, PeerInfo};
