//! Error types for the relay server and client.
//!
//! Every variant is fatal for the process that observes it; the binaries
//! report it on stderr and exit with status 1.

use crate::config::ConfigError;
use std::io;
use std::net::SocketAddr;

/// Errors raised while setting up or running a relay session.
#[derive(Debug)]
pub enum RelayError {
    /// Configuration could not be loaded.
    Config(ConfigError),
    /// Socket creation failed.
    Socket(io::Error),
    /// Binding the listening socket failed (e.g. address in use).
    Bind(SocketAddr, io::Error),
    /// Switching the socket into listening mode failed.
    Listen(SocketAddr, io::Error),
    /// Accepting the client connection failed.
    Accept(io::Error),
    /// Connecting to the server failed.
    Connect(SocketAddr, io::Error),
    /// Read or write failure on an established connection or the console.
    Io(io::Error),
}

impl std::fmt::Display for RelayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelayError::Config(e) => write!(f, "{e}"),
            RelayError::Socket(e) => write!(f, "Error creating the socket: {e}"),
            RelayError::Bind(addr, e) => write!(f, "Error binding the socket to {addr}: {e}"),
            RelayError::Listen(addr, e) => write!(f, "Error listening on {addr}: {e}"),
            RelayError::Accept(e) => write!(f, "Error accepting the client: {e}"),
            RelayError::Connect(addr, e) => {
                write!(f, "Error connecting to the server at {addr}: {e}")
            }
            RelayError::Io(e) => write!(f, "Connection I/O error: {e}"),
        }
    }
}

impl std::error::Error for RelayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RelayError::Config(e) => Some(e),
            RelayError::Socket(e)
            | RelayError::Bind(_, e)
            | RelayError::Listen(_, e)
            | RelayError::Accept(e)
            | RelayError::Connect(_, e)
            | RelayError::Io(e) => Some(e),
        }
    }
}

impl From<ConfigError> for RelayError {
    fn from(e: ConfigError) -> Self {
        RelayError::Config(e)
    }
}

impl From<io::Error> for RelayError {
    fn from(e: io::Error) -> Self {
        RelayError::Io(e)
    }
}
