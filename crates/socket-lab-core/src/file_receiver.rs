//! Datagram file receiver.
//!
//! The first datagram names the destination file; every later datagram is
//! appended to it in arrival order; a zero-length datagram ends the
//! transfer. Nothing detects lost or reordered datagrams, so the file is only
//! as faithful as the network underneath.
//!
//! A transfer that fails after the file was opened (idle timeout, I/O
//! error) flushes what it received and leaves that partial file in place;
//! the error says the transfer did not complete.

use crate::error::{LabError, LabResult};
use crate::path_policy::PathPolicy;
use serde::Serialize;
use socket_lab_abstract::TransferConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

/// Result of one datagram receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatagramOutcome {
    /// `len` bytes were written to the front of the receive buffer.
    Payload { len: usize, from: SocketAddr },
    /// A zero-length datagram: the sender is done.
    EndOfTransfer { from: SocketAddr },
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferReport {
    pub path: PathBuf,
    pub sender: SocketAddr,
    pub datagrams: u64,
    pub bytes: u64,
    /// Datagrams dropped because they came from a different sender.
    pub ignored: u64,
}

pub struct FileReceiver {
    socket: UdpSocket,
    policy: PathPolicy,
    buffer_size: usize,
    pin_sender: bool,
    idle_timeout: Option<Duration>,
}

impl FileReceiver {
    pub async fn bind(config: &TransferConfig) -> LabResult<Self> {
        if config.buffer_size == 0 {
            return Err(LabError::Config("buffer_size must be at least 1".into()));
        }
        let socket = UdpSocket::bind(config.bind)
            .await
            .map_err(|source| LabError::Bind {
                addr: config.bind,
                source,
            })?;
        info!("File receiver bound to {}", socket.local_addr()?);

        Ok(Self {
            socket,
            policy: PathPolicy::from_config(config),
            buffer_size: config.buffer_size,
            pin_sender: config.pin_sender,
            idle_timeout: config.idle_timeout_ms.map(Duration::from_millis),
        })
    }

    pub fn local_addr(&self) -> LabResult<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Wait for the next datagram, honoring the idle timeout.
    pub async fn recv_datagram(&self, buf: &mut [u8]) -> LabResult<DatagramOutcome> {
        let (len, from) = match self.idle_timeout {
            Some(limit) => tokio::time::timeout(limit, self.socket.recv_from(buf))
                .await
                .map_err(|_| LabError::Timeout(limit))??,
            None => self.socket.recv_from(buf).await?,
        };
        Ok(if len == 0 {
            DatagramOutcome::EndOfTransfer { from }
        } else {
            DatagramOutcome::Payload { len, from }
        })
    }

    /// Run one complete transfer and release the socket.
    pub async fn receive(self) -> LabResult<TransferReport> {
        let mut buf = vec![0u8; self.buffer_size];

        let (path, sender) = match self.recv_datagram(&mut buf).await? {
            DatagramOutcome::Payload { len, from } => (self.policy.resolve_payload(&buf[..len])?, from),
            DatagramOutcome::EndOfTransfer { .. } => return Err(LabError::EmptyPath),
        };
        info!("Receiving {} from {sender}", path.display());

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .await
            .map_err(|source| LabError::FileOpen {
                path: path.clone(),
                source,
            })?;
        let mut file = BufWriter::new(file);

        let mut report = TransferReport {
            path,
            sender,
            datagrams: 0,
            bytes: 0,
            ignored: 0,
        };

        let copied = self.append_datagrams(&mut file, &mut buf, &mut report).await;
        let flushed = file.flush().await;
        if let Err(e) = copied {
            // Bytes that arrived before the failure are kept on disk.
            if let Err(flush_err) = flushed {
                warn!("Flushing {} failed: {flush_err}", report.path.display());
            }
            warn!(
                "Transfer into {} stopped after {} bytes, partial file kept: {e}",
                report.path.display(),
                report.bytes
            );
            return Err(e);
        }
        flushed?;
        file.into_inner().sync_all().await?;
        info!(
            "File received: {} ({} bytes in {} datagrams)",
            report.path.display(),
            report.bytes,
            report.datagrams
        );
        Ok(report)
    }

    /// Append payloads to `file` until the end-of-transfer datagram.
    async fn append_datagrams(
        &self,
        file: &mut BufWriter<File>,
        buf: &mut [u8],
        report: &mut TransferReport,
    ) -> LabResult<()> {
        let sender = report.sender;
        loop {
            let outcome = self.recv_datagram(buf).await?;
            let from = match outcome {
                DatagramOutcome::Payload { from, .. } | DatagramOutcome::EndOfTransfer { from } => from,
            };
            if self.pin_sender && from != sender {
                warn!("Ignoring datagram from {from}, transfer belongs to {sender}");
                report.ignored += 1;
                continue;
            }

            match outcome {
                DatagramOutcome::EndOfTransfer { .. } => return Ok(()),
                DatagramOutcome::Payload { len, .. } => {
                    file.write_all(&buf[..len]).await?;
                    report.datagrams += 1;
                    report.bytes += len as u64;
                    debug!("Appended {len} byte(s) from {from}");
                }
            }
        }
    }
}
