//! Line relay wire protocol.
//!
//! The wire carries raw newline-terminated text from the client to the
//! server with no framing beyond the newline:
//!
//! ```text
//! Client -> Server:  <bytes>\n
//! Client -> Server:  exit\n      (sentinel, ends both loops)
//! ```
//!
//! Nothing is ever sent back to the client.

/// The literal payload that ends a session.
pub const SENTINEL: &[u8] = b"exit\n";

/// Prefix the server prints before every relayed line.
pub const MESSAGE_PREFIX: &str = "Message from client: ";

pub const SERVER_BANNER: &str = "Starting the server ....";
pub const CLIENT_BANNER: &str = "Starting the Client ...";
pub const CLIENT_PROMPT: &str = "Enter the message to send: ";

/// Exact, length-aware sentinel comparison.
pub fn is_sentinel(bytes: &[u8]) -> bool {
    bytes == SENTINEL
}

/// A message as seen by either end of the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message<'a> {
    /// The session-ending sentinel.
    Exit,
    /// Any other payload, newline included when present.
    Line(&'a [u8]),
}

impl<'a> Message<'a> {
    pub fn classify(bytes: &'a [u8]) -> Self {
        if is_sentinel(bytes) {
            Message::Exit
        } else {
            Message::Line(bytes)
        }
    }
}

/// What [`bound_line`] did to a line of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineBound {
    /// Already newline-terminated and within capacity.
    Fits,
    /// Last line of input had no newline; one was appended.
    Terminated,
    /// Content exceeded `capacity - 1` bytes and the excess was dropped.
    Truncated { dropped: usize },
}

/// Bound one line of input to `capacity` bytes, newline included.
///
/// The result always ends in exactly the newline it was read with (or an
/// appended one), so the server can split the stream on `\n`.
pub fn bound_line(line: &mut Vec<u8>, capacity: usize) -> LineBound {
    debug_assert!(capacity >= 2, "capacity must fit one byte plus newline");

    let has_newline = line.last() == Some(&b'\n');
    let content_len = line.len() - usize::from(has_newline);
    let max_content = capacity - 1;

    if content_len > max_content {
        line.truncate(max_content);
        line.push(b'\n');
        LineBound::Truncated {
            dropped: content_len - max_content,
        }
    } else if !has_newline {
        line.push(b'\n');
        LineBound::Terminated
    } else {
        LineBound::Fits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_is_exact() {
        assert!(is_sentinel(b"exit\n"));
        assert!(!is_sentinel(b"exit"));
        assert!(!is_sentinel(b"exit\n\0"));
        assert!(!is_sentinel(b"exit\r\n"));
        assert!(!is_sentinel(b" exit\n"));
        assert!(!is_sentinel(b"EXIT\n"));
    }

    #[test]
    fn test_classify() {
        assert_eq!(Message::classify(b"exit\n"), Message::Exit);
        assert_eq!(Message::classify(b"hi\n"), Message::Line(b"hi\n"));
        assert_eq!(Message::classify(b""), Message::Line(b""));
    }

    #[test]
    fn test_bound_line_fits() {
        let mut line = b"hello\n".to_vec();
        assert_eq!(bound_line(&mut line, 1024), LineBound::Fits);
        assert_eq!(line, b"hello\n");
    }

    #[test]
    fn test_bound_line_at_limit() {
        let mut line = vec![b'a'; 1023];
        line.push(b'\n');
        assert_eq!(bound_line(&mut line, 1024), LineBound::Fits);
        assert_eq!(line.len(), 1024);
    }

    #[test]
    fn test_bound_line_truncates() {
        let mut line = vec![b'a'; 1030];
        line.push(b'\n');
        assert_eq!(
            bound_line(&mut line, 1024),
            LineBound::Truncated { dropped: 7 }
        );
        assert_eq!(line.len(), 1024);
        assert_eq!(line.last(), Some(&b'\n'));
    }

    #[test]
    fn test_bound_line_terminates_last_line() {
        let mut line = b"exit".to_vec();
        assert_eq!(bound_line(&mut line, 1024), LineBound::Terminated);
        assert!(is_sentinel(&line));
    }
}
