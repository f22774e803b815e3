use crate::error::{LabError, LabResult};
use crate::framing::{FrameReader, ReadOutcome};
use serde::Serialize;
use socket_lab_abstract::{ACKNOWLEDGMENT, EchoConfig, is_sentinel};
use std::future::Future;
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpSocket};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Target of the `received <message>` event, the server's line of output
/// for every message it reads. The binary keeps this target at `info`
/// whatever `RUST_LOG` says.
pub const RECEIVED_TARGET: &str = "socket_lab::received";

/// Why a session ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CloseReason {
    /// The client sent a message starting with `exit` and got its reply.
    Sentinel,
    /// The client closed the connection.
    PeerClosed,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub peer: SocketAddr,
    pub messages: u32,
    pub reason: CloseReason,
}

/// Listening side of the echo protocol.
pub struct EchoServer {
    listener: TcpListener,
    max_frame: usize,
}

impl EchoServer {
    pub async fn bind(config: &EchoConfig) -> LabResult<Self> {
        if config.max_frame == 0 {
            return Err(LabError::Config("max_frame must be at least 1".into()));
        }
        let addr = config.bind;
        let bind_err = |source| LabError::Bind { addr, source };

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .map_err(bind_err)?;
        socket.set_reuseaddr(true).map_err(bind_err)?;
        socket.bind(addr).map_err(bind_err)?;
        let listener = socket.listen(config.backlog).map_err(bind_err)?;

        info!(
            "Echo server listening on {} (backlog {})",
            listener.local_addr()?,
            config.backlog
        );
        Ok(Self {
            listener,
            max_frame: config.max_frame,
        })
    }

    pub fn local_addr(&self) -> LabResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept a single client, serve it to the end and give up the listener.
    pub async fn serve_one(self) -> LabResult<SessionSummary> {
        let (stream, peer) = self.listener.accept().await?;
        info!("Client connected: {peer}");
        serve_session(stream, peer, self.max_frame).await
    }

    /// Accept clients until `shutdown` resolves, one task per connection.
    /// Sessions still running at shutdown are awaited before returning.
    pub async fn serve<F>(self, shutdown: F) -> LabResult<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut sessions = JoinSet::new();

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, no longer accepting clients");
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        info!("Client connected: {peer}");
                        let max_frame = self.max_frame;
                        sessions.spawn(async move {
                            (peer, serve_session(stream, peer, max_frame).await)
                        });
                    }
                    Err(e) => warn!("Accept failed: {e}"),
                },
                Some(joined) = sessions.join_next(), if !sessions.is_empty() => {
                    log_session(joined);
                }
            }
        }

        if !sessions.is_empty() {
            info!("Waiting for {} open session(s)", sessions.len());
        }
        while let Some(joined) = sessions.join_next().await {
            log_session(joined);
        }
        Ok(())
    }
}

fn log_session(
    joined: Result<(SocketAddr, LabResult<SessionSummary>), tokio::task::JoinError>,
) {
    match joined {
        Ok((_, Ok(summary))) => info!(
            "Session with {} closed ({:?}) after {} message(s)",
            summary.peer, summary.reason, summary.messages
        ),
        Ok((peer, Err(e))) => warn!("Session with {peer} failed: {e}"),
        Err(e) => warn!("Session task aborted: {e}"),
    }
}

/// Run the read/reply loop on one connected stream.
///
/// Every frame gets exactly one [`ACKNOWLEDGMENT`] and one
/// `received <message>` event on [`RECEIVED_TARGET`]. The loop ends after
/// the reply to a sentinel message or when the peer closes; both sides of
/// the stream are released when this returns.
pub async fn serve_session<S>(stream: S, peer: SocketAddr, max_frame: usize) -> LabResult<SessionSummary>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (read_half, mut write_half) = tokio::io::split(stream);
    let mut frames = FrameReader::new(read_half, max_frame);
    let mut messages = 0;

    let reason = loop {
        let message = match frames.read_frame().await? {
            ReadOutcome::Message(message) => message,
            ReadOutcome::PeerClosed => break CloseReason::PeerClosed,
        };
        messages += 1;
        write_half.write_all(ACKNOWLEDGMENT).await?;
        info!(
            target: RECEIVED_TARGET,
            "received {}",
            String::from_utf8_lossy(&message).trim_end()
        );

        if is_sentinel(&message) {
            break CloseReason::Sentinel;
        }
    };

    if let Err(e) = write_half.shutdown().await {
        debug!("Shutdown of {peer} after {reason:?} failed: {e}");
    }
    Ok(SessionSummary {
        peer,
        messages,
        reason,
    })
}
