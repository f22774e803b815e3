use crate::protocol::{DEFAULT_BUFFER_SIZE, DEFAULT_PORT};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EchoConfig {
    /// Address the echo server listens on.
    pub bind: SocketAddr,
    /// Address the echo client connects to.
    pub server: SocketAddr,
    /// Pending-connection queue length passed to `listen`.
    pub backlog: u32,
    /// Longest accepted frame, newline included.
    pub max_frame: usize,
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            server: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_PORT),
            backlog: 3,
            max_frame: DEFAULT_BUFFER_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransferConfig {
    /// Address the file receiver binds its datagram socket to.
    pub bind: SocketAddr,
    /// Receive buffer capacity; larger datagrams are truncated by the OS.
    pub buffer_size: usize,
    /// Directory untrusted destination paths are confined to.
    pub base_dir: PathBuf,
    /// Honor the requested path verbatim, absolute paths and `..` included.
    pub trust_paths: bool,
    /// Only accept data from the sender of the path datagram.
    pub pin_sender: bool,
    /// Give up when no datagram arrives for this long. `None` waits forever.
    pub idle_timeout_ms: Option<u64>,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            buffer_size: DEFAULT_BUFFER_SIZE,
            base_dir: PathBuf::from("."),
            trust_paths: false,
            pin_sender: false,
            idle_timeout_ms: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LabConfig {
    pub echo: EchoConfig,
    pub transfer: TransferConfig,
}
