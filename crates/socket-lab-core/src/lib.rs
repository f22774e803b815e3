pub mod echo_client;
pub mod echo_server;
pub mod error;
pub mod file_receiver;
pub mod file_sender;
pub mod framing;
pub mod path_policy;

pub use echo_client::{ClientExit, EchoClient};
pub use echo_server::{CloseReason, EchoServer, RECEIVED_TARGET, SessionSummary, serve_session};
pub use error::{LabError, LabResult};
pub use file_receiver::{DatagramOutcome, FileReceiver, TransferReport};
pub use file_sender::{FileSender, SendReport};
pub use framing::{FrameReader, ReadOutcome};
pub use path_policy::PathPolicy;
