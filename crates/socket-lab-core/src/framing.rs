//! Newline framing for the echo stream.
//!
//! TCP does not keep message boundaries, so one `read` may return half a
//! message or several of them. [`FrameReader`] buffers the stream and hands
//! out exactly one newline-terminated frame per call.

use crate::error::{LabError, LabResult};
use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Result of a single framed read. A clean close by the peer is a value,
/// I/O failures come back as `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// One frame, trailing newline included when the peer sent one.
    Message(Bytes),
    /// The peer shut down its side and every buffered byte was handed out.
    PeerClosed,
}

pub struct FrameReader<R> {
    inner: R,
    buffer: BytesMut,
    max_frame: usize,
    eof: bool,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R, max_frame: usize) -> Self {
        Self {
            inner,
            buffer: BytesMut::with_capacity(max_frame),
            max_frame,
            eof: false,
        }
    }

    pub async fn read_frame(&mut self) -> LabResult<ReadOutcome> {
        loop {
            if let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
                if pos + 1 > self.max_frame {
                    return Err(LabError::FrameTooLong {
                        limit: self.max_frame,
                    });
                }
                return Ok(ReadOutcome::Message(self.buffer.split_to(pos + 1).freeze()));
            }
            if self.buffer.len() >= self.max_frame {
                return Err(LabError::FrameTooLong {
                    limit: self.max_frame,
                });
            }
            if self.eof {
                if self.buffer.is_empty() {
                    return Ok(ReadOutcome::PeerClosed);
                }
                // Unterminated tail sent right before the close.
                return Ok(ReadOutcome::Message(self.buffer.split().freeze()));
            }

            self.buffer.reserve(self.max_frame);
            if self.inner.read_buf(&mut self.buffer).await? == 0 {
                self.eof = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    fn message(text: &str) -> ReadOutcome {
        ReadOutcome::Message(Bytes::copy_from_slice(text.as_bytes()))
    }

    #[tokio::test]
    async fn splits_coalesced_messages() {
        let mut frames = FrameReader::new(&b"hello\nworld\n"[..], 64);
        assert_eq!(frames.read_frame().await.unwrap(), message("hello\n"));
        assert_eq!(frames.read_frame().await.unwrap(), message("world\n"));
        assert_eq!(frames.read_frame().await.unwrap(), ReadOutcome::PeerClosed);
        // Stays closed.
        assert_eq!(frames.read_frame().await.unwrap(), ReadOutcome::PeerClosed);
    }

    #[tokio::test]
    async fn joins_partial_reads() {
        let (mut tx, rx) = tokio::io::duplex(8);
        let writer = tokio::spawn(async move {
            tx.write_all(b"hel").await.unwrap();
            tx.flush().await.unwrap();
            tokio::task::yield_now().await;
            tx.write_all(b"lo\n").await.unwrap();
        });

        let mut frames = FrameReader::new(rx, 64);
        assert_eq!(frames.read_frame().await.unwrap(), message("hello\n"));
        writer.await.unwrap();
        assert_eq!(frames.read_frame().await.unwrap(), ReadOutcome::PeerClosed);
    }

    #[tokio::test]
    async fn unterminated_tail_is_the_last_message() {
        let mut frames = FrameReader::new(&b"one\ntwo"[..], 64);
        assert_eq!(frames.read_frame().await.unwrap(), message("one\n"));
        assert_eq!(frames.read_frame().await.unwrap(), message("two"));
        assert_eq!(frames.read_frame().await.unwrap(), ReadOutcome::PeerClosed);
    }

    #[tokio::test]
    async fn empty_stream_is_peer_closed() {
        let mut frames = FrameReader::new(&b""[..], 64);
        assert_eq!(frames.read_frame().await.unwrap(), ReadOutcome::PeerClosed);
    }

    #[tokio::test]
    async fn rejects_frames_over_the_limit() {
        let mut frames = FrameReader::new(&b"0123456789\n"[..], 8);
        let err = frames.read_frame().await.unwrap_err();
        assert!(matches!(err, LabError::FrameTooLong { limit: 8 }));
    }

    #[tokio::test]
    async fn frame_exactly_at_the_limit_is_accepted() {
        let mut frames = FrameReader::new(&b"1234567\n"[..], 8);
        assert_eq!(frames.read_frame().await.unwrap(), message("1234567\n"));
    }
}
