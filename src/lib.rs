//! line-relay: a blocking TCP line relay
//!
//! Two processes share this library:
//! - `relay-server` binds, accepts exactly one client and prints every
//!   line it receives
//! - `relay-client` connects and sends typed lines until "exit"
//!
//! Features:
//! - Newline-terminated text, no other framing
//! - `exit\n` sentinel ends both sides; a peer disconnect ends the server
//! - Bounded, length-tracked message buffer (1024 bytes by default)
//! - Configuration via CLI arguments or TOML file

pub mod buffer;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod server;
pub mod session;

pub use client::Client;
pub use error::RelayError;
pub use server::Server;
