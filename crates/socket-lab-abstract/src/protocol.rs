/// Well-known port used by both the echo pair and the file receiver.
pub const DEFAULT_PORT: u16 = 8080;

/// Capacity of a transfer buffer: the largest echo frame and the largest
/// datagram payload accepted by the file receiver.
pub const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Fixed reply the echo server sends for every message it reads.
pub const ACKNOWLEDGMENT: &[u8] = b"message received \n";

/// Leading bytes of a message that ends the echo session.
pub const SENTINEL: &[u8] = b"exit";

/// Interactive prompt printed by the echo client before each input line.
pub const PROMPT: &str = "Enter the message: ";

/// Prefix the echo client prints in front of every server reply.
pub const REPLY_PREFIX: &str = "Server Reply: ";

/// True when the first four bytes of `message` are the `exit` sentinel.
pub fn is_sentinel(message: &[u8]) -> bool {
    message.starts_with(SENTINEL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_only_checks_the_prefix() {
        assert!(is_sentinel(b"exit"));
        assert!(is_sentinel(b"exit\n"));
        assert!(is_sentinel(b"exiting now"));
        assert!(!is_sentinel(b"exi"));
        assert!(!is_sentinel(b" exit"));
        assert!(!is_sentinel(b"EXIT"));
    }

    #[test]
    fn acknowledgment_is_one_line() {
        assert_eq!(ACKNOWLEDGMENT.last(), Some(&b'\n'));
        assert_eq!(
            ACKNOWLEDGMENT.iter().filter(|&&b| b == b'\n').count(),
            1
        );
    }
}
