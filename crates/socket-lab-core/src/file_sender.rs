use crate::error::{LabError, LabResult};
use serde::Serialize;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tokio::net::UdpSocket;
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize)]
pub struct SendReport {
    pub target: SocketAddr,
    pub datagrams: u64,
    pub bytes: u64,
}

/// Sending side of the datagram file transfer: the destination path, the
/// data in chunks of at most `chunk_size` bytes, then an empty datagram.
pub struct FileSender {
    socket: UdpSocket,
    target: SocketAddr,
    chunk_size: usize,
}

impl FileSender {
    /// Bind an ephemeral local port of the same family as `target`.
    pub async fn connect(target: SocketAddr, chunk_size: usize) -> LabResult<Self> {
        if chunk_size == 0 {
            return Err(LabError::Config("chunk_size must be at least 1".into()));
        }
        let local = match target.ip() {
            IpAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            IpAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
        };
        let socket = UdpSocket::bind(local)
            .await
            .map_err(|source| LabError::Bind { addr: local, source })?;
        Ok(Self {
            socket,
            target,
            chunk_size,
        })
    }

    pub fn local_addr(&self) -> LabResult<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    pub async fn send_file(&self, destination: &str, source: &Path) -> LabResult<SendReport> {
        let mut file = File::open(source).await.map_err(|e| LabError::FileOpen {
            path: source.to_path_buf(),
            source: e,
        })?;
        self.send_destination(destination).await?;

        let mut report = self.empty_report();
        let mut chunk = vec![0u8; self.chunk_size];
        loop {
            let n = file.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            self.send_chunk(&chunk[..n], &mut report).await?;
        }
        self.finish(report).await
    }

    pub async fn send_bytes(&self, destination: &str, data: &[u8]) -> LabResult<SendReport> {
        self.send_destination(destination).await?;
        let mut report = self.empty_report();
        for chunk in data.chunks(self.chunk_size) {
            self.send_chunk(chunk, &mut report).await?;
        }
        self.finish(report).await
    }

    async fn send_destination(&self, destination: &str) -> LabResult<()> {
        // An empty name would be read as the end-of-transfer marker.
        if destination.is_empty() {
            return Err(LabError::EmptyPath);
        }
        if destination.len() > self.chunk_size {
            return Err(LabError::InvalidPath(destination.to_string()));
        }
        self.socket.send_to(destination.as_bytes(), self.target).await?;
        info!("Sending {destination} to {}", self.target);
        Ok(())
    }

    async fn send_chunk(&self, chunk: &[u8], report: &mut SendReport) -> LabResult<()> {
        let sent = self.socket.send_to(chunk, self.target).await?;
        report.datagrams += 1;
        report.bytes += sent as u64;
        debug!("Sent {sent} byte(s) to {}", self.target);
        Ok(())
    }

    async fn finish(&self, report: SendReport) -> LabResult<SendReport> {
        self.socket.send_to(&[], self.target).await?;
        info!(
            "Transfer to {} finished: {} bytes in {} datagrams",
            self.target, report.bytes, report.datagrams
        );
        Ok(report)
    }

    fn empty_report(&self) -> SendReport {
        SendReport {
            target: self.target,
            datagrams: 0,
            bytes: 0,
        }
    }
}
