//! Connection lifecycle state.

use std::fmt;

/// Lifecycle state of one chat connection.
///
/// Exactly one manager instance is active per open channel view; switching
/// channels tears the previous instance down before the next one's events
/// are trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport held. The initial and terminal state.
    Disconnected,
    /// Handshake in flight.
    Connecting,
    /// Transport open; frames flow and `send` is permitted.
    Connected,
}

impl ConnectionState {
    /// Whether a new `connect()` may start from this state.
    pub fn can_connect(self) -> bool {
        matches!(self, ConnectionState::Disconnected)
    }

    /// Whether `send` is permitted in this state.
    pub fn can_send(self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        };
        f.write_str(label)
    }
}
