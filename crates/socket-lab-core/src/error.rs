use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open {}: {}", .path.display(), .source)]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Frame exceeds {limit} bytes without a newline")]
    FrameTooLong { limit: usize },

    #[error("Message needs {len} bytes but frames are limited to {limit}")]
    MessageTooLong { len: usize, limit: usize },

    #[error("Message contains an embedded newline")]
    MultiLineMessage,

    #[error("Destination path datagram is empty")]
    EmptyPath,

    #[error("Destination path is not a valid file name: {0:?}")]
    InvalidPath(String),

    #[error("Destination path escapes the receive directory: {0:?}")]
    UnsafePath(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type LabResult<T> = Result<T, LabError>;
