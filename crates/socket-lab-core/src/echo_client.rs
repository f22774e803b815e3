use crate::error::{LabError, LabResult};
use crate::framing::{FrameReader, ReadOutcome};
use socket_lab_abstract::{DEFAULT_BUFFER_SIZE, PROMPT, REPLY_PREFIX, is_sentinel};
use std::net::SocketAddr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing::{debug, info};

/// How an interactive session ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientExit {
    /// The input reached end-of-file.
    InputClosed,
    /// The server answered an `exit` message.
    SentinelAcknowledged,
    /// The server closed the connection.
    ServerClosed,
}

/// Client side of the echo protocol.
///
/// `max_frame` must not exceed the server's limit: the server drops a
/// connection that sends a longer frame.
pub struct EchoClient {
    server: SocketAddr,
    max_frame: usize,
    replies: FrameReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl EchoClient {
    pub async fn connect(server: SocketAddr, max_frame: usize) -> LabResult<Self> {
        // One content byte plus the newline.
        if max_frame < 2 {
            return Err(LabError::Config("max_frame must be at least 2".into()));
        }
        let stream = TcpStream::connect(server)
            .await
            .map_err(|source| LabError::Connect {
                addr: server,
                source,
            })?;
        info!("Connected to echo server at {server}");
        let (read_half, writer) = stream.into_split();
        Ok(Self {
            server,
            max_frame,
            // Replies are bounded by the receive buffer, not by what we send.
            replies: FrameReader::new(read_half, DEFAULT_BUFFER_SIZE),
            writer,
        })
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server
    }

    /// Send one single-line message and wait for its reply.
    ///
    /// A trailing newline is optional and added when missing. Messages with
    /// an embedded newline or that do not fit in one frame are refused
    /// before anything is sent, so every request maps to exactly one reply.
    pub async fn request(&mut self, message: &[u8]) -> LabResult<ReadOutcome> {
        let body = message.strip_suffix(&b"\n"[..]).unwrap_or(message);
        if body.contains(&b'\n') {
            return Err(LabError::MultiLineMessage);
        }
        if body.len() + 1 > self.max_frame {
            return Err(LabError::MessageTooLong {
                len: body.len() + 1,
                limit: self.max_frame,
            });
        }

        self.writer.write_all(body).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        debug!("Sent {} byte(s) to {}", body.len() + 1, self.server);
        self.replies.read_frame().await
    }

    /// Prompt, read a line from `input`, send it, print the reply to
    /// `output`; repeat until one side is done.
    ///
    /// A line longer than a frame is sent as several frames, each answered
    /// and printed on its own, the way `fgets` hands out a long line in
    /// buffer-sized pieces.
    pub async fn run<I, O>(&mut self, mut input: I, mut output: O) -> LabResult<ClientExit>
    where
        I: AsyncBufRead + Unpin,
        O: AsyncWrite + Unpin,
    {
        loop {
            output.write_all(PROMPT.as_bytes()).await?;
            output.flush().await?;

            let mut line = String::new();
            if input.read_line(&mut line).await? == 0 {
                return Ok(ClientExit::InputClosed);
            }

            for piece in split_line(line.as_bytes(), self.max_frame) {
                let reply = match self.request(piece).await? {
                    ReadOutcome::Message(reply) => reply,
                    ReadOutcome::PeerClosed => {
                        info!("Server {} closed the connection", self.server);
                        return Ok(ClientExit::ServerClosed);
                    }
                };
                output.write_all(REPLY_PREFIX.as_bytes()).await?;
                output.write_all(&reply).await?;
                output.flush().await?;

                if is_sentinel(piece) {
                    return Ok(ClientExit::SentinelAcknowledged);
                }
            }
        }
    }
}

/// Cut one input line into pieces that fit a frame once the newline is
/// added. An empty line stays one empty piece.
fn split_line(line: &[u8], max_frame: usize) -> Vec<&[u8]> {
    let body = line.strip_suffix(&b"\n"[..]).unwrap_or(line);
    if body.is_empty() {
        return vec![body];
    }
    body.chunks(max_frame - 1).collect()
}

#[cfg(test)]
mod tests {
    use super::split_line;

    #[test]
    fn short_lines_are_one_piece() {
        assert_eq!(split_line(b"hello\n", 8), vec![&b"hello"[..]]);
        assert_eq!(split_line(b"1234567\n", 8), vec![&b"1234567"[..]]);
        assert_eq!(split_line(b"no newline", 64), vec![&b"no newline"[..]]);
    }

    #[test]
    fn empty_line_is_still_sent() {
        assert_eq!(split_line(b"\n", 8), vec![&b""[..]]);
    }

    #[test]
    fn long_lines_are_cut_to_the_frame_size() {
        let pieces = split_line(b"this line is too long\n", 8);
        assert_eq!(pieces, vec![&b"this li"[..], &b"ne is t"[..], &b"oo long"[..]]);
        assert!(pieces.iter().all(|p| p.len() + 1 <= 8));
    }
}
