//! Relay server.
//!
//! Binds one listening socket, accepts exactly one client, then prints
//! every line the client sends until the `exit\n` sentinel arrives or the
//! client goes away. All I/O is blocking on the calling thread.

use crate::buffer::MessageBuffer;
use crate::config::ServerConfig;
use crate::error::RelayError;
use crate::protocol::{Message, MESSAGE_PREFIX};
use crate::session::{CloseReason, Role, Session};
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use tracing::{debug, info, trace};

/// A bound, listening relay server.
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    buffer_size: usize,
}

impl Server {
    /// Create the listening socket.
    ///
    /// Fails if the address is already in use; `SO_REUSEPORT` is never set.
    pub fn bind(config: &ServerConfig) -> Result<Self, RelayError> {
        let listener = create_listener(config.listen, config.backlog)?;
        let local_addr = listener.local_addr()?;

        info!(
            addr = %local_addr,
            backlog = config.backlog,
            buffer_size = config.buffer_size,
            "Server listening"
        );

        Ok(Server {
            listener,
            local_addr,
            buffer_size: config.buffer_size,
        })
    }

    /// Address actually bound (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Block until one client connects.
    ///
    /// The listening socket is closed as soon as the client is accepted.
    pub fn accept_one(self) -> Result<Connection, RelayError> {
        let mut session = Session::new(Role::Server);
        let (stream, peer) = self.listener.accept().map_err(RelayError::Accept)?;
        drop(self.listener);

        info!(peer = %peer, "Client connected");
        session.connected(peer);

        Ok(Connection {
            stream,
            session,
            buffer: MessageBuffer::new(self.buffer_size),
        })
    }

    /// Accept one client and relay its lines to `console`.
    pub fn run<W: Write>(self, console: &mut W) -> Result<Session, RelayError> {
        self.accept_one()?.relay(console)
    }
}

/// The single accepted client connection.
///
/// The socket is closed when this value is dropped, on every exit path.
pub struct Connection {
    stream: TcpStream,
    session: Session,
    buffer: MessageBuffer,
}

impl Connection {
    pub fn peer(&self) -> Option<SocketAddr> {
        self.session.peer()
    }

    /// Run the receive loop to completion and return the closed session.
    pub fn relay<W: Write>(mut self, console: &mut W) -> Result<Session, RelayError> {
        relay(
            &mut self.stream,
            console,
            &mut self.buffer,
            &mut self.session,
        )?;
        Ok(self.session)
    }
}

/// Receive loop.
///
/// Prints each line as `MESSAGE_PREFIX + line`. Stops on the sentinel,
/// which is not printed, or when `reader` reports end of stream, in which
/// case a trailing partial line is printed first.
pub fn relay<R: Read, W: Write>(
    reader: &mut R,
    console: &mut W,
    buffer: &mut MessageBuffer,
    session: &mut Session,
) -> io::Result<CloseReason> {
    loop {
        while let Some(message) = buffer.next_message() {
            match Message::classify(&message) {
                Message::Exit => {
                    debug!("Received exit sentinel");
                    session.close(CloseReason::Sentinel);
                    return Ok(CloseReason::Sentinel);
                }
                Message::Line(line) => {
                    print_line(console, line)?;
                    session.record(line.len());
                }
            }
        }

        let n = buffer.fill(reader)?;
        if n == 0 {
            if let Some(rest) = buffer.take_remainder() {
                print_line(console, &rest)?;
                session.record(rest.len());
            }
            info!("Client disconnected without sending exit");
            session.close(CloseReason::PeerClosed);
            return Ok(CloseReason::PeerClosed);
        }
        trace!(bytes = n, "Received data");
    }
}

fn print_line<W: Write>(console: &mut W, line: &[u8]) -> io::Result<()> {
    console.write_all(MESSAGE_PREFIX.as_bytes())?;
    console.write_all(line)?;
    console.flush()
}

/// Create a blocking TCP listener with an explicit backlog.
fn create_listener(addr: SocketAddr, backlog: i32) -> Result<TcpListener, RelayError> {
    let socket = socket2::Socket::new(
        match addr {
            SocketAddr::V4(_) => socket2::Domain::IPV4,
            SocketAddr::V6(_) => socket2::Domain::IPV6,
        },
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )
    .map_err(RelayError::Socket)?;

    socket
        .bind(&addr.into())
        .map_err(|e| RelayError::Bind(addr, e))?;
    socket
        .listen(backlog)
        .map_err(|e| RelayError::Listen(addr, e))?;

    Ok(socket.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::thread;

    fn test_config(listen: &str) -> ServerConfig {
        ServerConfig {
            listen: listen.parse().unwrap(),
            backlog: 1,
            buffer_size: 1024,
            log_level: "info".to_string(),
        }
    }

    fn run_relay(input: &[u8]) -> (String, CloseReason, Session) {
        let mut reader = Cursor::new(input.to_vec());
        let mut console = Vec::new();
        let mut buffer = MessageBuffer::new(1024);
        let mut session = Session::new(Role::Server);
        let reason = relay(&mut reader, &mut console, &mut buffer, &mut session).unwrap();
        (String::from_utf8(console).unwrap(), reason, session)
    }

    #[test]
    fn test_relay_prints_lines_until_sentinel() {
        let (out, reason, session) = run_relay(b"hello world\nhi\nexit\n");
        assert_eq!(
            out,
            "Message from client: hello world\nMessage from client: hi\n"
        );
        assert_eq!(reason, CloseReason::Sentinel);
        assert_eq!(session.messages(), 2);
        assert_eq!(session.bytes(), 15);
    }

    #[test]
    fn test_relay_ignores_data_after_sentinel() {
        let (out, reason, _) = run_relay(b"exit\nafter\n");
        assert_eq!(out, "");
        assert_eq!(reason, CloseReason::Sentinel);
    }

    #[test]
    fn test_relay_peer_closed() {
        let (out, reason, session) = run_relay(b"abc\n");
        assert_eq!(out, "Message from client: abc\n");
        assert_eq!(reason, CloseReason::PeerClosed);
        assert_eq!(session.close_reason(), Some(CloseReason::PeerClosed));
    }

    #[test]
    fn test_relay_flushes_partial_line_on_close() {
        let (out, reason, _) = run_relay(b"one\nexit");
        assert_eq!(out, "Message from client: one\nMessage from client: exit");
        assert_eq!(reason, CloseReason::PeerClosed);
    }

    #[test]
    fn test_relay_sentinel_is_not_a_prefix_match() {
        let (out, reason, _) = run_relay(b"exit now\nexit\n");
        assert_eq!(out, "Message from client: exit now\n");
        assert_eq!(reason, CloseReason::Sentinel);
    }

    #[test]
    fn test_relay_longest_line_after_short_line() {
        let long = "x".repeat(1023);
        let input = format!("a\n{long}\nexit\n");

        let (out, reason, session) = run_relay(input.as_bytes());
        assert_eq!(
            out,
            format!("Message from client: a\nMessage from client: {long}\n")
        );
        assert_eq!(reason, CloseReason::Sentinel);
        assert_eq!(session.messages(), 2);
        assert_eq!(session.bytes(), 2 + 1024);
    }

    #[test]
    fn test_bind_fails_when_port_in_use() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = taken.local_addr().unwrap();

        match Server::bind(&test_config(&addr.to_string())) {
            Err(RelayError::Bind(failed, e)) => {
                assert_eq!(failed, addr);
                assert_eq!(e.kind(), io::ErrorKind::AddrInUse);
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("bind succeeded on a port in use"),
        }
    }

    #[test]
    fn test_end_to_end_sentinel() {
        let server = Server::bind(&test_config("127.0.0.1:0")).unwrap();
        let addr = server.local_addr();

        let client = thread::spawn(move || {
            let mut stream = TcpStream::connect(addr).unwrap();
            stream.write_all(b"hello world\n").unwrap();
            stream.write_all(b"hi\n").unwrap();
            stream.write_all(b"exit\n").unwrap();
        });

        let mut console = Vec::new();
        let session = server.run(&mut console).unwrap();
        client.join().unwrap();

        assert_eq!(
            String::from_utf8(console).unwrap(),
            "Message from client: hello world\nMessage from client: hi\n"
        );
        assert_eq!(session.close_reason(), Some(CloseReason::Sentinel));
        assert!(session.peer().is_some());
    }

    #[test]
    fn test_end_to_end_peer_disconnect() {
        let server = Server::bind(&test_config("127.0.0.1:0")).unwrap();
        let addr = server.local_addr();

        let client = thread::spawn(move || {
            let mut stream = TcpStream::connect(addr).unwrap();
            stream.write_all(b"hi\n").unwrap();
        });

        let connection = server.accept_one().unwrap();
        assert!(connection.peer().is_some());

        let mut console = Vec::new();
        let session = connection.relay(&mut console).unwrap();
        client.join().unwrap();

        assert_eq!(String::from_utf8(console).unwrap(), "Message from client: hi\n");
        assert_eq!(session.close_reason(), Some(CloseReason::PeerClosed));
    }
}
