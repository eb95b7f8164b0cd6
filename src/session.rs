//! Session state machine for the single relayed connection.
//!
//! Server: `Listening -> Connected -> Closed(reason)`
//! Client: `Disconnected -> Connected -> Closed(reason)`
//!
//! Each session also counts the messages and bytes it relayed so a
//! summary can be logged when it closes.

use std::net::SocketAddr;
use tracing::info;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The `exit\n` sentinel was sent or received.
    Sentinel,
    /// The peer closed the connection without sending the sentinel.
    PeerClosed,
    /// The client's input stream ended before the sentinel was typed.
    InputClosed,
}

/// Which end of the relay a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Server,
    Client,
}

/// Current state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Server only: waiting for the client.
    Listening,
    /// Client only: not yet connected.
    Disconnected,
    /// Connection established; relaying lines.
    Connected { peer: SocketAddr },
    /// Terminal.
    Closed(CloseReason),
}

/// One relay session and its counters.
#[derive(Debug)]
pub struct Session {
    role: Role,
    state: SessionState,
    peer: Option<SocketAddr>,
    messages: u64,
    bytes: u64,
}

impl Session {
    /// Create a session in the role's initial state.
    pub fn new(role: Role) -> Self {
        let state = match role {
            Role::Server => SessionState::Listening,
            Role::Client => SessionState::Disconnected,
        };
        Self {
            role,
            state,
            peer: None,
            messages: 0,
            bytes: 0,
        }
    }

    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Messages relayed, sentinel excluded.
    pub fn messages(&self) -> u64 {
        self.messages
    }

    /// Bytes relayed, sentinel excluded.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, SessionState::Closed(_))
    }

    /// The reason the session closed, if it has.
    pub fn close_reason(&self) -> Option<CloseReason> {
        match self.state {
            SessionState::Closed(reason) => Some(reason),
            _ => None,
        }
    }

    /// Transition to `Connected`.
    pub fn connected(&mut self, peer: SocketAddr) {
        debug_assert!(!self.is_closed(), "connect on a closed session");
        self.peer = Some(peer);
        self.state = SessionState::Connected { peer };
    }

    /// Count one relayed message.
    pub fn record(&mut self, len: usize) {
        self.messages += 1;
        self.bytes += len as u64;
    }

    /// Transition to `Closed` and log the session summary.
    ///
    /// Closing twice keeps the first reason.
    pub fn close(&mut self, reason: CloseReason) {
        if self.is_closed() {
            return;
        }
        self.state = SessionState::Closed(reason);
        info!(
            role = ?self.role,
            peer = ?self.peer,
            reason = ?reason,
            messages = self.messages,
            bytes = self.bytes,
            "Session closed"
        );
    }
}
