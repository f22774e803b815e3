pub mod config;
pub mod profile;
pub mod protocol;

pub use config::{EchoConfig, LabConfig, TransferConfig};
pub use profile::{EchoOverride, LabProfile, TransferOverride};
// Wire constants shared by every endpoint
pub use protocol::{ACKNOWLEDGMENT, DEFAULT_BUFFER_SIZE, DEFAULT_PORT, PROMPT, REPLY_PREFIX, SENTINEL};
pub use protocol::is_sentinel;
